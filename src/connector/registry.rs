//! Connector registry
//!
//! Resolves a database alias to a connector instance. Resolution order is
//! fixed: an alias-level `connector` override wins, then the engine mapping
//! from settings merged over the built-in defaults, then the built-in
//! default for the engine. Unknown identifiers fail with `ConnectorNotFound`.
//!
//! Identifiers are plain strings registered in a static table, so a
//! misconfigured override fails at settings validation rather than at
//! first use.

use super::{
    Connector, MongoDumpConnector, MysqlDumpConnector, PgDumpConnector, PgDumpGisConnector,
    SqliteConnector,
};
use crate::config::{DatabaseConfig, Settings};
use crate::error::{BackupError, BackupResult};

type Factory = fn(DatabaseConfig) -> Box<dyn Connector>;

fn make_postgres(config: DatabaseConfig) -> Box<dyn Connector> {
    Box::new(PgDumpConnector::new(config))
}

fn make_postgres_gis(config: DatabaseConfig) -> Box<dyn Connector> {
    Box::new(PgDumpGisConnector::new(config))
}

fn make_mysql(config: DatabaseConfig) -> Box<dyn Connector> {
    Box::new(MysqlDumpConnector::new(config))
}

fn make_sqlite(config: DatabaseConfig) -> Box<dyn Connector> {
    Box::new(SqliteConnector::new(config))
}

fn make_mongodb(config: DatabaseConfig) -> Box<dyn Connector> {
    Box::new(MongoDumpConnector::new(config))
}

/// Registered connector identifiers and their factories
const CONNECTORS: &[(&str, Factory)] = &[
    ("postgres", make_postgres),
    ("postgres-gis", make_postgres_gis),
    ("mysql", make_mysql),
    ("sqlite", make_sqlite),
    ("mongodb", make_mongodb),
];

/// Built-in engine-to-connector mapping
const DEFAULT_ENGINE_MAPPING: &[(&str, &str)] = &[
    ("postgresql", "postgres"),
    ("postgres", "postgres"),
    ("postgis", "postgres-gis"),
    ("mysql", "mysql"),
    ("mariadb", "mysql"),
    ("sqlite", "sqlite"),
    ("sqlite3", "sqlite"),
    ("spatialite", "sqlite"),
    ("mongodb", "mongodb"),
];

/// Check whether a connector identifier is registered
pub fn is_registered(identifier: &str) -> bool {
    CONNECTORS.iter().any(|(id, _)| *id == identifier)
}

/// Instantiate a connector by registered identifier
pub fn connector_for(
    identifier: &str,
    config: DatabaseConfig,
) -> BackupResult<Box<dyn Connector>> {
    CONNECTORS
        .iter()
        .find(|(id, _)| *id == identifier)
        .map(|(_, factory)| factory(config))
        .ok_or_else(|| BackupError::ConnectorNotFound {
            kind: "connector identifier",
            identifier: identifier.to_string(),
        })
}

/// Resolve a connector for a database alias
///
/// Precedence: alias-level override, then settings engine mapping (merged
/// over the built-in defaults, overrides win), then built-in default.
pub fn resolve(alias: &str, settings: &Settings) -> BackupResult<Box<dyn Connector>> {
    let db = settings.database(alias)?;

    if let Some(identifier) = &db.connector {
        return connector_for(identifier, db.clone());
    }

    let engine = db.engine.as_str();
    if let Some(identifier) = settings.connector_mapping.get(engine) {
        return connector_for(identifier, db.clone());
    }

    let identifier = DEFAULT_ENGINE_MAPPING
        .iter()
        .find(|(e, _)| *e == engine)
        .map(|(_, id)| *id)
        .ok_or_else(|| BackupError::engine_not_found(engine))?;

    connector_for(identifier, db.clone())
}
