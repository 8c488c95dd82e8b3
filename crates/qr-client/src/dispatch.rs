//! Command dispatch
//!
//! UI intents are expressed as [`Command`] values and routed to the list
//! controller of the targeted table. Commands also have a short textual
//! form used by the console:
//!
//! ```text
//! users filter status completed
//! assessments filter search acme corp
//! certificates page 2
//! users limit 25
//! assessments refresh
//! logout
//! ```

use crate::error::{Error, Result};
use crate::list::{FetchOutcome, ListViewController};
use crate::resources::{AssessmentsAdapter, CertificatesAdapter, ResourceAdapter, UsersAdapter};
use crate::session::Session;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Admin tables the console can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Assessments,
    Certificates,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Users, Table::Assessments, Table::Certificates];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Assessments => "assessments",
            Table::Certificates => "certificates",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "users" => Ok(Table::Users),
            "assessments" => Ok(Table::Assessments),
            "certificates" => Ok(Table::Certificates),
            other => Err(Error::Validation(format!("Unknown table: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank `value` clears the filter
    SetFilter {
        table: Table,
        name: String,
        value: String,
    },
    SetPage {
        table: Table,
        page: u32,
    },
    SetPageSize {
        table: Table,
        page_size: u32,
    },
    Refresh {
        table: Table,
    },
    Logout,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut words = input.split_whitespace();
        let first = words
            .next()
            .ok_or_else(|| Error::Validation("Empty command".into()))?;

        if first.eq_ignore_ascii_case("logout") {
            return Ok(Command::Logout);
        }

        let table: Table = first.parse()?;
        let action = words.next().unwrap_or("refresh").to_ascii_lowercase();

        match action.as_str() {
            "filter" => {
                let name = words
                    .next()
                    .ok_or_else(|| Error::Validation("filter needs a name".into()))?
                    .to_string();
                let value = words.collect::<Vec<_>>().join(" ");
                Ok(Command::SetFilter { table, name, value })
            }
            "page" => Ok(Command::SetPage {
                table,
                page: parse_number(words.next(), "page")?,
            }),
            "limit" | "page-size" => Ok(Command::SetPageSize {
                table,
                page_size: parse_number(words.next(), "page size")?,
            }),
            "refresh" => Ok(Command::Refresh { table }),
            other => Err(Error::Validation(format!("Unknown action: {}", other))),
        }
    }
}

fn parse_number(word: Option<&str>, what: &str) -> Result<u32> {
    word.and_then(|w| w.parse().ok())
        .ok_or_else(|| Error::Validation(format!("{} must be a positive number", what)))
}

/// What dispatching a command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A fetch was scheduled behind the debounce timer
    Scheduled,
    Fetched(FetchOutcome),
    LoggedOut,
}

/// Object-safe view of a [`ListViewController`] of any resource
#[async_trait]
pub trait ListControl: Send + Sync {
    fn resource(&self) -> &'static str;

    fn set_filter(&self, name: &str, value: &str) -> Result<()>;

    async fn set_page(&self, page: u32) -> Result<FetchOutcome>;

    async fn set_page_size(&self, page_size: u32) -> Result<FetchOutcome>;

    async fn refresh(&self) -> FetchOutcome;

    fn dispose(&self);
}

#[async_trait]
impl<A: ResourceAdapter> ListControl for ListViewController<A> {
    fn resource(&self) -> &'static str {
        self.adapter().resource()
    }

    fn set_filter(&self, name: &str, value: &str) -> Result<()> {
        ListViewController::set_filter(self, name, value)
    }

    async fn set_page(&self, page: u32) -> Result<FetchOutcome> {
        ListViewController::set_page(self, page).await
    }

    async fn set_page_size(&self, page_size: u32) -> Result<FetchOutcome> {
        ListViewController::set_page_size(self, page_size).await
    }

    async fn refresh(&self) -> FetchOutcome {
        ListViewController::refresh(self).await
    }

    fn dispose(&self) {
        ListViewController::dispose(self)
    }
}

/// Routes commands to one controller per table
pub struct Dispatcher {
    session: Arc<Session>,
    users: ListViewController<UsersAdapter>,
    assessments: ListViewController<AssessmentsAdapter>,
    certificates: ListViewController<CertificatesAdapter>,
}

impl Dispatcher {
    pub fn new(
        session: Arc<Session>,
        users: ListViewController<UsersAdapter>,
        assessments: ListViewController<AssessmentsAdapter>,
        certificates: ListViewController<CertificatesAdapter>,
    ) -> Self {
        Self {
            session,
            users,
            assessments,
            certificates,
        }
    }

    pub fn controller(&self, table: Table) -> &dyn ListControl {
        match table {
            Table::Users => &self.users,
            Table::Assessments => &self.assessments,
            Table::Certificates => &self.certificates,
        }
    }

    pub fn users(&self) -> &ListViewController<UsersAdapter> {
        &self.users
    }

    pub fn assessments(&self) -> &ListViewController<AssessmentsAdapter> {
        &self.assessments
    }

    pub fn certificates(&self) -> &ListViewController<CertificatesAdapter> {
        &self.certificates
    }

    pub async fn dispatch(&self, command: Command) -> Result<Dispatched> {
        debug!(?command, "Dispatching command");
        match command {
            Command::SetFilter { table, name, value } => {
                self.controller(table).set_filter(&name, &value)?;
                Ok(Dispatched::Scheduled)
            }
            Command::SetPage { table, page } => {
                let outcome = self.controller(table).set_page(page).await?;
                Ok(Dispatched::Fetched(outcome))
            }
            Command::SetPageSize { table, page_size } => {
                let outcome = self.controller(table).set_page_size(page_size).await?;
                Ok(Dispatched::Fetched(outcome))
            }
            Command::Refresh { table } => Ok(Dispatched::Fetched(self.controller(table).refresh().await)),
            Command::Logout => {
                for table in Table::ALL {
                    self.controller(table).dispose();
                }
                self.session.clear()?;
                info!("Logged out");
                Ok(Dispatched::LoggedOut)
            }
        }
    }

    /// Parse and dispatch the textual form of a command
    pub async fn dispatch_line(&self, line: &str) -> Result<Dispatched> {
        let command: Command = line.parse()?;
        self.dispatch(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gateway::RequestExecutor;
    use crate::list::{ListRenderer, ListView};
    use crate::request::{ApiResponse, RequestDescriptor};
    use crate::session::Token;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "users filter status completed".parse::<Command>().unwrap(),
            Command::SetFilter {
                table: Table::Users,
                name: "status".into(),
                value: "completed".into()
            }
        );
        assert_eq!(
            "assessments filter search acme  corp".parse::<Command>().unwrap(),
            Command::SetFilter {
                table: Table::Assessments,
                name: "search".into(),
                value: "acme corp".into()
            }
        );
        assert_eq!(
            "Certificates page 2".parse::<Command>().unwrap(),
            Command::SetPage {
                table: Table::Certificates,
                page: 2
            }
        );
        assert_eq!(
            "users limit 25".parse::<Command>().unwrap(),
            Command::SetPageSize {
                table: Table::Users,
                page_size: 25
            }
        );
        assert_eq!(
            "users".parse::<Command>().unwrap(),
            Command::Refresh { table: Table::Users }
        );
        assert_eq!("logout".parse::<Command>().unwrap(), Command::Logout);
    }

    #[test]
    fn test_parse_errors() {
        for input in ["", "reports page 1", "users page x", "users filter", "users sort name"] {
            let err = input.parse::<Command>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError, "{}", input);
        }
    }

    /// Records the paths it was asked for and returns empty lists
    #[derive(Default)]
    struct PathRecorder {
        paths: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RequestExecutor for PathRecorder {
        async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
            self.paths.lock().push(request.path.clone());
            Ok(ApiResponse::json(200, json!({})))
        }
    }

    struct Silent;

    impl<E> ListRenderer<E> for Silent {
        fn render(&self, _view: &ListView<E>) {}
        fn show_error(&self, _context: &str, _error: &Error) {}
    }

    fn dispatcher(executor: Arc<PathRecorder>, session: Arc<Session>) -> Dispatcher {
        let renderer = Arc::new(Silent);
        Dispatcher::new(
            session,
            ListViewController::new(UsersAdapter, executor.clone(), renderer.clone()),
            ListViewController::new(AssessmentsAdapter, executor.clone(), renderer.clone()),
            ListViewController::new(CertificatesAdapter, executor, renderer),
        )
    }

    #[tokio::test]
    async fn test_routes_to_table_controller() {
        let executor = Arc::new(PathRecorder::default());
        let dispatcher = dispatcher(executor.clone(), Arc::new(Session::in_memory()));

        let outcome = dispatcher.dispatch_line("certificates page 1").await.unwrap();
        assert_eq!(outcome, Dispatched::Fetched(FetchOutcome::Applied));
        dispatcher.dispatch_line("assessments refresh").await.unwrap();

        assert_eq!(
            *executor.paths.lock(),
            vec!["/api/admin/certificates".to_string(), "/api/admin/assessments".to_string()]
        );
    }

    #[tokio::test]
    async fn test_filter_is_scheduled() {
        let executor = Arc::new(PathRecorder::default());
        let dispatcher = dispatcher(executor, Arc::new(Session::in_memory()));

        let outcome = dispatcher.dispatch_line("users filter status completed").await.unwrap();
        assert_eq!(outcome, Dispatched::Scheduled);
        assert_eq!(dispatcher.users().query().filter("status"), Some("completed"));
        assert!(dispatcher.dispatch_line("users filter colour red").await.is_err());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let session = Arc::new(Session::in_memory());
        session.set_tokens(Token::from("a"), Token::from("r")).unwrap();
        let dispatcher = dispatcher(Arc::new(PathRecorder::default()), session.clone());

        assert_eq!(dispatcher.dispatch(Command::Logout).await.unwrap(), Dispatched::LoggedOut);
        assert!(!session.is_authenticated());
    }
}
