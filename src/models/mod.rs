//! Data models for Bibliotheca

pub mod author;
pub mod book;
pub mod enums;
pub mod genre;
pub mod notification;
pub mod pagination;
pub mod reading_list;
pub mod review;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails, BookSummary};
pub use enums::{AvailabilityStatus, Role, TransactionType};
pub use genre::Genre;
pub use notification::Notification;
pub use pagination::Pagination;
pub use reading_list::ReadingList;
pub use review::Review;
pub use transaction::{BookTransaction, TransactionDetails};
pub use user::User;
