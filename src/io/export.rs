use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{KhataService, Statement};
use crate::domain::StatementFilter;

/// Statement document handed to downstream renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementExport {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub statement: Statement,
}

/// Exporter for handing statements to other tools as JSON.
pub struct Exporter<'a> {
    service: &'a KhataService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a KhataService) -> Self {
        Self { service }
    }

    /// Build a party's statement and write it as pretty-printed JSON.
    pub async fn export_statement_json<W: Write>(
        &self,
        party_name: &str,
        filter: StatementFilter,
        mut writer: W,
    ) -> Result<StatementExport> {
        let statement = self.service.statement(party_name, filter).await?;

        let export = StatementExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            statement,
        };

        serde_json::to_writer_pretty(&mut writer, &export)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(export)
    }
}
