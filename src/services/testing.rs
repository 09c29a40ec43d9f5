//! Test doubles for the repository and mail seams

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::mock;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorRef, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, BookSummary, CreateBook, UpdateBook},
        enums::{AvailabilityStatus, Role, TransactionType},
        genre::{CreateGenre, Genre, UpdateGenre},
        notification::Notification,
        reading_list::ReadingList,
        review::{CreateReview, Review, UpdateReview},
        transaction::{BookTransaction, NewReservation, TransactionDetails, TransactionFilter},
        user::{NewUser, User, UserQuery},
    },
    repository::{
        users::ProfileChanges, AuthorsRepository, BooksRepository, GenresRepository,
        NotificationsRepository, ReadingListsRepository, Repository, ReviewsRepository,
        TransactionsRepository, UsersRepository,
    },
    services::email::Mailer,
};

mock! {
    pub BooksRepo {}

    #[async_trait]
    impl BooksRepository for BooksRepo {
        async fn get_by_id(&self, id: i32) -> AppResult<Book>;
        async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)>;
        async fn authors_of(&self, book_id: i32) -> AppResult<Vec<AuthorRef>>;
        async fn by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>>;
        async fn create(&self, book: &CreateBook) -> AppResult<Book>;
        async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book>;
        async fn delete(&self, id: i32) -> AppResult<()>;
        async fn set_status(&self, id: i32, status: AvailabilityStatus) -> AppResult<()>;
        async fn genre_history(&self, patron_id: i32) -> AppResult<Vec<i32>>;
        async fn recommend(&self, genre_id: i32, patron_id: i32, limit: i64) -> AppResult<Vec<BookSummary>>;
    }
}

mock! {
    pub AuthorsRepo {}

    #[async_trait]
    impl AuthorsRepository for AuthorsRepo {
        async fn list(&self, name: Option<String>) -> AppResult<Vec<Author>>;
        async fn get_by_id(&self, id: i32) -> AppResult<Author>;
        async fn create(&self, author: &CreateAuthor) -> AppResult<Author>;
        async fn update(&self, id: i32, author: &UpdateAuthor) -> AppResult<Author>;
        async fn delete(&self, id: i32) -> AppResult<()>;
    }
}

mock! {
    pub GenresRepo {}

    #[async_trait]
    impl GenresRepository for GenresRepo {
        async fn list(&self) -> AppResult<Vec<Genre>>;
        async fn get_by_id(&self, id: i32) -> AppResult<Genre>;
        async fn get_by_name(&self, name: &str) -> AppResult<Option<Genre>>;
        async fn count_books(&self, id: i32) -> AppResult<i64>;
        async fn create(&self, genre: &CreateGenre) -> AppResult<Genre>;
        async fn update(&self, id: i32, genre: &UpdateGenre) -> AppResult<Genre>;
        async fn delete(&self, id: i32) -> AppResult<()>;
    }
}

mock! {
    pub UsersRepo {}

    #[async_trait]
    impl UsersRepository for UsersRepo {
        async fn get_by_id(&self, id: i32) -> AppResult<User>;
        async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;
        async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool>;
        async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool>;
        async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)>;
        async fn count_with_role(&self, role: Role) -> AppResult<i64>;
        async fn create(&self, user: &NewUser) -> AppResult<User>;
        async fn update_profile(&self, id: i32, changes: &ProfileChanges) -> AppResult<User>;
        async fn set_role(&self, id: i32, role: Role) -> AppResult<User>;
        async fn delete(&self, id: i32) -> AppResult<()>;
    }
}

mock! {
    pub TransactionsRepo {}

    #[async_trait]
    impl TransactionsRepository for TransactionsRepo {
        async fn get_by_id(&self, id: i32) -> AppResult<BookTransaction>;
        async fn list_all(&self) -> AppResult<Vec<BookTransaction>>;
        async fn search(&self, filter: &TransactionFilter) -> AppResult<Vec<TransactionDetails>>;
        async fn for_patron(&self, patron_id: i32) -> AppResult<Vec<TransactionDetails>>;
        async fn active_for_book(&self, book_id: i32) -> AppResult<Option<BookTransaction>>;
        async fn create_reservation(&self, reservation: &NewReservation) -> AppResult<BookTransaction>;
        async fn save(&self, transaction: &BookTransaction) -> AppResult<()>;
        async fn delete(&self, transaction: &BookTransaction) -> AppResult<()>;
    }
}

mock! {
    pub ReadingListsRepo {}

    #[async_trait]
    impl ReadingListsRepository for ReadingListsRepo {
        async fn get_by_id(&self, id: i32) -> AppResult<ReadingList>;
        async fn for_user(&self, user_id: i32) -> AppResult<Vec<ReadingList>>;
        async fn create(&self, user_id: i32, name: &str) -> AppResult<ReadingList>;
        async fn rename(&self, id: i32, name: &str) -> AppResult<ReadingList>;
        async fn delete(&self, id: i32) -> AppResult<()>;
        async fn books(&self, list_id: i32) -> AppResult<Vec<BookSummary>>;
        async fn contains(&self, list_id: i32, book_id: i32) -> AppResult<bool>;
        async fn add_book(&self, list_id: i32, book_id: i32) -> AppResult<()>;
        async fn remove_book(&self, list_id: i32, book_id: i32) -> AppResult<bool>;
    }
}

mock! {
    pub ReviewsRepo {}

    #[async_trait]
    impl ReviewsRepository for ReviewsRepo {
        async fn get_by_id(&self, id: i32) -> AppResult<Review>;
        async fn for_book(&self, book_id: i32) -> AppResult<Vec<Review>>;
        async fn find(&self, book_id: i32, user_id: i32) -> AppResult<Option<Review>>;
        async fn create(&self, book_id: i32, user_id: i32, review: &CreateReview) -> AppResult<Review>;
        async fn update(&self, id: i32, review: &UpdateReview) -> AppResult<Review>;
        async fn delete(&self, id: i32) -> AppResult<()>;
    }
}

mock! {
    pub NotificationsRepo {}

    #[async_trait]
    impl NotificationsRepository for NotificationsRepo {
        async fn create(&self, user_id: i32, message: &str) -> AppResult<Notification>;
        async fn get_by_id(&self, id: i32) -> AppResult<Notification>;
        async fn for_user(&self, user_id: i32, unread_only: bool) -> AppResult<Vec<Notification>>;
        async fn count_unread(&self, user_id: i32) -> AppResult<i64>;
        async fn mark_read(&self, id: i32) -> AppResult<()>;
        async fn mark_all_read(&self, user_id: i32) -> AppResult<u64>;
    }
}

mock! {
    pub MailerImpl {}

    #[async_trait]
    impl Mailer for MailerImpl {
        async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
    }
}

/// One mock per repository; calling a mock without an expectation panics
#[derive(Default)]
pub struct MockRepos {
    pub books: MockBooksRepo,
    pub authors: MockAuthorsRepo,
    pub genres: MockGenresRepo,
    pub users: MockUsersRepo,
    pub transactions: MockTransactionsRepo,
    pub reading_lists: MockReadingListsRepo,
    pub reviews: MockReviewsRepo,
    pub notifications: MockNotificationsRepo,
}

impl MockRepos {
    pub fn build(self) -> Repository {
        Repository {
            pool: None,
            books: Arc::new(self.books),
            authors: Arc::new(self.authors),
            genres: Arc::new(self.genres),
            users: Arc::new(self.users),
            transactions: Arc::new(self.transactions),
            reading_lists: Arc::new(self.reading_lists),
            reviews: Arc::new(self.reviews),
            notifications: Arc::new(self.notifications),
        }
    }
}

pub fn repository_with_users(users: MockUsersRepo) -> Repository {
    MockRepos {
        users,
        ..Default::default()
    }
    .build()
}

pub fn book(id: i32) -> Book {
    Book {
        id,
        title: format!("Book {}", id),
        isbn: None,
        description: None,
        publisher: None,
        publication_year: Some(2001),
        genre_id: Some(1),
        availability_status: AvailabilityStatus::Available,
        created_at: Utc::now(),
    }
}

pub fn summary(id: i32, genre_id: i32) -> BookSummary {
    BookSummary {
        id,
        title: format!("Book {}", id),
        isbn: None,
        publication_year: None,
        genre_id: Some(genre_id),
        genre_name: None,
        availability_status: AvailabilityStatus::Available,
        authors: vec![],
    }
}

pub fn user(id: i32, role: Role) -> User {
    User {
        id,
        username: format!("user{}", id),
        email: format!("patron{}@library.org", id),
        password_hash: String::new(),
        first_name: None,
        last_name: None,
        role,
        created_at: Utc::now(),
    }
}

pub fn patron(id: i32) -> User {
    user(id, Role::Patron)
}

pub fn notification(id: i32, user_id: i32, message: &str) -> Notification {
    Notification {
        id,
        user_id,
        message: message.to_string(),
        is_read: false,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// In-memory library
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LibraryState {
    books: BTreeMap<i32, Book>,
    users: BTreeMap<i32, User>,
    transactions: BTreeMap<i32, BookTransaction>,
    notifications: Vec<Notification>,
    next_id: i32,
}

impl LibraryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Stateful store backing books, users, transactions and notifications,
/// enough to drive the lending lifecycle end to end.
#[derive(Default)]
pub struct MemoryLibrary {
    state: Mutex<LibraryState>,
}

impl MemoryLibrary {
    pub fn with_books(books: &[(i32, AvailabilityStatus)]) -> Arc<Self> {
        let library = Self::default();
        {
            let mut state = library.state.lock().unwrap();
            for (id, status) in books {
                let mut entry = book(*id);
                entry.availability_status = *status;
                state.books.insert(*id, entry);
            }
        }
        Arc::new(library)
    }

    pub fn add_patron(&self, id: i32) {
        self.state.lock().unwrap().users.insert(id, patron(id));
    }

    pub fn repository(self: &Arc<Self>) -> Repository {
        let mut repository = MockRepos::default().build();
        repository.books = self.clone();
        repository.users = self.clone();
        repository.transactions = self.clone();
        repository.notifications = self.clone();
        repository
    }

    pub fn insert_transaction(
        &self,
        book_id: i32,
        patron_id: i32,
        kind: TransactionType,
        due_date: DateTime<Utc>,
    ) -> i32 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.transactions.insert(
            id,
            BookTransaction {
                id,
                book_id,
                patron_id,
                transaction_date: due_date - Duration::days(14),
                due_date,
                transaction_type: kind,
                is_returned: kind == TransactionType::Returned,
            },
        );
        id
    }

    pub fn book_status(&self, id: i32) -> AvailabilityStatus {
        self.state.lock().unwrap().books[&id].availability_status
    }

    pub fn transaction(&self, id: i32) -> BookTransaction {
        self.state.lock().unwrap().transactions[&id].clone()
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    pub fn notifications_for(&self, user_id: i32) -> Vec<Notification> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

fn missing(what: &str, id: i32) -> AppError {
    AppError::NotFound(format!("{} with id {} not found", what, id))
}

#[async_trait]
impl BooksRepository for MemoryLibrary {
    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let state = self.state.lock().unwrap();
        state.books.get(&id).cloned().ok_or_else(|| missing("Book", id))
    }

    async fn search(&self, _query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn authors_of(&self, _book_id: i32) -> AppResult<Vec<AuthorRef>> {
        Ok(vec![])
    }

    async fn by_author(&self, _author_id: i32) -> AppResult<Vec<BookSummary>> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn create(&self, _book: &CreateBook) -> AppResult<Book> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn update(&self, _id: i32, _book: &UpdateBook) -> AppResult<Book> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.books.remove(&id).map(|_| ()).ok_or_else(|| missing("Book", id))
    }

    async fn set_status(&self, id: i32, status: AvailabilityStatus) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let book = state.books.get_mut(&id).ok_or_else(|| missing("Book", id))?;
        book.availability_status = status;
        Ok(())
    }

    async fn genre_history(&self, patron_id: i32) -> AppResult<Vec<i32>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .values()
            .filter(|t| t.patron_id == patron_id)
            .filter_map(|t| state.books.get(&t.book_id).and_then(|b| b.genre_id))
            .collect())
    }

    async fn recommend(&self, _genre_id: i32, _patron_id: i32, _limit: i64) -> AppResult<Vec<BookSummary>> {
        unimplemented!("not used by lifecycle tests")
    }
}

#[async_trait]
impl UsersRepository for MemoryLibrary {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let state = self.state.lock().unwrap();
        state.users.get(&id).cloned().ok_or_else(|| missing("User", id))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(username) && Some(u.id) != exclude_id))
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != exclude_id))
    }

    async fn search(&self, _query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn count_with_role(&self, role: Role) -> AppResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().filter(|u| u.role == role).count() as i64)
    }

    async fn create(&self, _user: &NewUser) -> AppResult<User> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn update_profile(&self, _id: i32, _changes: &ProfileChanges) -> AppResult<User> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn set_role(&self, id: i32, role: Role) -> AppResult<User> {
        let mut state = self.state.lock().unwrap();
        let user = state.users.get_mut(&id).ok_or_else(|| missing("User", id))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.users.remove(&id).map(|_| ()).ok_or_else(|| missing("User", id))
    }
}

#[async_trait]
impl TransactionsRepository for MemoryLibrary {
    async fn get_by_id(&self, id: i32) -> AppResult<BookTransaction> {
        let state = self.state.lock().unwrap();
        state
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("Transaction", id))
    }

    async fn list_all(&self) -> AppResult<Vec<BookTransaction>> {
        let state = self.state.lock().unwrap();
        Ok(state.transactions.values().cloned().collect())
    }

    async fn search(&self, _filter: &TransactionFilter) -> AppResult<Vec<TransactionDetails>> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn for_patron(&self, _patron_id: i32) -> AppResult<Vec<TransactionDetails>> {
        unimplemented!("not used by lifecycle tests")
    }

    async fn active_for_book(&self, book_id: i32) -> AppResult<Option<BookTransaction>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .values()
            .find(|t| t.book_id == book_id && t.is_active())
            .cloned())
    }

    async fn create_reservation(&self, reservation: &NewReservation) -> AppResult<BookTransaction> {
        let mut state = self.state.lock().unwrap();
        let book = state
            .books
            .get_mut(&reservation.book_id)
            .ok_or_else(|| missing("Book", reservation.book_id))?;
        if book.availability_status != AvailabilityStatus::Available {
            return Err(AppError::Unavailable(format!(
                "Book {} is not available",
                reservation.book_id
            )));
        }
        book.availability_status = AvailabilityStatus::Reserved;

        let id = state.next_id();
        let transaction = BookTransaction {
            id,
            book_id: reservation.book_id,
            patron_id: reservation.patron_id,
            transaction_date: reservation.transaction_date,
            due_date: reservation.due_date,
            transaction_type: TransactionType::Reserved,
            is_returned: false,
        };
        state.transactions.insert(id, transaction.clone());
        Ok(transaction)
    }

    async fn save(&self, transaction: &BookTransaction) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.transactions.contains_key(&transaction.id) {
            return Err(missing("Transaction", transaction.id));
        }
        state.transactions.insert(transaction.id, transaction.clone());
        if let Some(book) = state.books.get_mut(&transaction.book_id) {
            book.availability_status = AvailabilityStatus::from(transaction.transaction_type);
        }
        Ok(())
    }

    async fn delete(&self, transaction: &BookTransaction) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .transactions
            .remove(&transaction.id)
            .ok_or_else(|| missing("Transaction", transaction.id))?;
        if transaction.is_active() {
            if let Some(book) = state.books.get_mut(&transaction.book_id) {
                book.availability_status = AvailabilityStatus::Available;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationsRepository for MemoryLibrary {
    async fn create(&self, user_id: i32, message: &str) -> AppResult<Notification> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let created = notification(id, user_id, message);
        state.notifications.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Notification> {
        let state = self.state.lock().unwrap();
        state
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| missing("Notification", id))
    }

    async fn for_user(&self, user_id: i32, unread_only: bool) -> AppResult<Vec<Notification>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect())
    }

    async fn count_unread(&self, user_id: i32) -> AppResult<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| missing("Notification", id))?;
        found.is_read = true;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: i32) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut changed = 0;
        for n in state.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
            n.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
