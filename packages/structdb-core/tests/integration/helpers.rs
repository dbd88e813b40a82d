//! Shared document types and fake clients.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use structdb_core::client::SqlExecutor;
use structdb_core::config::StoreConfig;
use structdb_core::memory::MemoryBackend;
use structdb_core::query::SqlCommandInfo;
use structdb_core::schema::StructureSchemas;
use structdb_core::session::{Session, SessionClients};
use structdb_core::structure::{MemberDescriptor, StructureId, TypeDescriptor, UniqueMode};
use structdb_core::{DataType, Result, Structure, Value};

/// Document with a single string index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StringItem {
    pub id: i64,
    pub string_value: String,
}

impl StringItem {
    pub fn new(value: &str) -> Self {
        Self {
            id: 0,
            string_value: value.to_string(),
        }
    }
}

impl Structure for StringItem {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new("StringItem")
            .member(MemberDescriptor::scalar("Id", DataType::Int64))
            .member(MemberDescriptor::scalar("StringValue", DataType::Text))
    }

    fn structure_id(&self) -> Option<StructureId> {
        Some(StructureId::Identity(self.id))
    }

    fn set_structure_id(&mut self, id: StructureId) {
        if let StructureId::Identity(value) = id {
            self.id = value;
        }
    }
}

/// Document whose code is unique across the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodedItem {
    pub id: i64,
    pub code: String,
}

impl CodedItem {
    pub fn new(code: &str) -> Self {
        Self {
            id: 0,
            code: code.to_string(),
        }
    }
}

impl Structure for CodedItem {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new("CodedItem")
            .member(MemberDescriptor::scalar("Id", DataType::Int64))
            .member(MemberDescriptor::scalar("Code", DataType::Text).unique(UniqueMode::PerType))
    }

    fn structure_id(&self) -> Option<StructureId> {
        Some(StructureId::Identity(self.id))
    }

    fn set_structure_id(&mut self, id: StructureId) {
        if let StructureId::Identity(value) = id {
            self.id = value;
        }
    }
}

/// Executor answering with canned results and recording every command.
#[derive(Default)]
pub struct RecordingExecutor {
    pub commands: Mutex<Vec<SqlCommandInfo>>,
    pub bodies: Mutex<Vec<String>>,
    pub scalar: Mutex<Option<Value>>,
}

impl SqlExecutor for RecordingExecutor {
    fn read_json(&self, command: &SqlCommandInfo) -> Result<Vec<String>> {
        self.commands.lock().push(command.clone());
        Ok(self.bodies.lock().clone())
    }

    fn execute_scalar(&self, command: &SqlCommandInfo) -> Result<Value> {
        self.commands.lock().push(command.clone());
        Ok(self.scalar.lock().clone().unwrap_or(Value::Null))
    }
}

/// Session over an in-memory backend plus a recording executor.
pub fn memory_session(
    config: &StoreConfig,
) -> (Session, Arc<MemoryBackend>, Arc<RecordingExecutor>) {
    let backend = Arc::new(MemoryBackend::new());
    let executor = Arc::new(RecordingExecutor::default());
    let mut clients = SessionClients::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        executor.clone(),
    );
    clients.seeds = Some(backend.clone());
    let session = Session::new(config, Arc::new(StructureSchemas::new()), clients);
    (session, backend, executor)
}
