//! Dispatch of parsed tool calls to the services behind them.

use super::{ToolCall, ToolResponse};
use crate::config::Settings;
use crate::error::{Result, ToolResult};
use crate::geocoding::Geocoder;
use crate::notebook::{MemoryNotebook, NotebookStore};
use crate::search::WebSearch;
use crate::session::SessionState;
use crate::store::DatabaseTools;
use crate::weather::{self, WeatherService};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Serialize)]
struct Message {
    message: String,
}

#[derive(Debug, Serialize)]
struct Recalled {
    key: String,
    value: String,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct Keys {
    keys: Vec<String>,
}

/// Every tool service, ready to execute calls.
pub struct Toolbox {
    weather: WeatherService,
    search: WebSearch,
    notebook: Arc<dyn NotebookStore>,
    database: DatabaseTools,
}

impl Toolbox {
    pub fn new(
        weather: WeatherService,
        search: WebSearch,
        notebook: Arc<dyn NotebookStore>,
        database: DatabaseTools,
    ) -> Self {
        Self {
            weather,
            search,
            notebook,
            database,
        }
    }

    /// Build every service from settings, with an in-memory notebook.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let geocoder = Arc::new(Geocoder::new(&settings.geocoding)?);
        let weather = WeatherService::new(&settings.weather, geocoder)?;
        let search = WebSearch::from_settings(&settings.search)?;
        let database = DatabaseTools::new(settings.store.default_path.clone());

        Ok(Self::new(
            weather,
            search,
            Arc::new(MemoryNotebook::new()),
            database,
        ))
    }

    /// Replace the database tools, e.g. to pin relative paths to a directory.
    pub fn with_database(mut self, database: DatabaseTools) -> Self {
        self.database = database;
        self
    }

    pub fn notebook(&self) -> &Arc<dyn NotebookStore> {
        &self.notebook
    }

    /// Execute a tool call for one conversation.
    #[instrument(skip(self, state), fields(tool = call.name()))]
    pub async fn execute(&self, call: &ToolCall, state: &mut SessionState) -> ToolResponse {
        info!("Executing tool {}", call.name());

        let response = match call {
            ToolCall::SearchWeb { query } => respond(self.search.search(query).await),
            ToolCall::GetWeather { city } => respond(self.weather.lookup(city, state).await),
            ToolCall::SetTemperatureUnit { unit } => respond(
                weather::set_temperature_unit(unit, state).map(|message| Message { message }),
            ),
            ToolCall::Remember { key, value } => respond(self.remember(key, value)),
            ToolCall::Recall { key } => respond(self.recall(key)),
            ToolCall::Forget { key } => respond(self.notebook.forget(key).map(|_| Message {
                message: format!("Forgot '{}'", key),
            })),
            ToolCall::ListMemories => respond(self.notebook.keys().map(|keys| Keys { keys })),
            ToolCall::SetDbPath { db_path } => {
                respond(self.database.configure_path(db_path, state))
            }
            ToolCall::CreateDatabase { db_path } => {
                respond(self.database.create_database(db_path, state))
            }
            ToolCall::CreateTable { query } => respond(self.database.create_table(query, state)),
            ToolCall::WriteQuery { query } => respond(self.database.write(query, state)),
            ToolCall::ReadQuery { query } => respond(self.database.read(query, state)),
            ToolCall::ListTables => respond(self.database.list_tables(state)),
            ToolCall::DescribeTable { table_name } => {
                respond(self.database.describe_table(table_name, state))
            }
        };

        if let ToolResponse::Error {
            error_message,
            error_kind,
        } = &response
        {
            warn!("Tool {} failed ({}): {}", call.name(), error_kind, error_message);
        }

        response
    }

    fn remember(&self, key: &str, value: &str) -> ToolResult<Message> {
        self.notebook.store(key, value)?;
        Ok(Message {
            message: format!("Remembered '{}'", key),
        })
    }

    fn recall(&self, key: &str) -> ToolResult<Recalled> {
        let entry = self.notebook.retrieve(key)?;
        Ok(Recalled {
            key: key.to_string(),
            value: entry.value,
            stored_at: entry.stored_at,
        })
    }
}

fn respond<T: Serialize>(result: ToolResult<T>) -> ToolResponse {
    ToolResponse::from_result(result)
}
