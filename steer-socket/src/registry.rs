use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use steer_common::CaptureConfig;
use steer_lang::{resolve, SymbolTable};
use steer_wire::ComputationDescriptor;

use crate::{Group, GroupError, GroupId, SocketId};

/// The process-wide group registry: owns the symbol table, the capture
/// configuration, and the id-to-group map.
///
/// The map is control-plane only — the fast path holds `Arc<Group>`
/// handles and never touches the lock. Destroying a group removes the
/// registry's reference; the group itself (and the program it holds)
/// is freed once the last in-flight holder is done with it.
#[derive(Debug)]
pub struct Groups {
    symbols: SymbolTable,
    config: CaptureConfig,
    groups: RwLock<FxHashMap<u32, Arc<Group>>>,
}

impl Default for Groups {
    fn default() -> Self {
        Self::new()
    }
}

impl Groups {
    /// A registry with the built-in symbol table and default
    /// configuration.
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            config: CaptureConfig::default(),
            groups: RwLock::new(FxHashMap::default()),
        }
    }

    /// A registry with a validated configuration.
    pub fn with_config(config: CaptureConfig) -> Result<Self, GroupError> {
        config.validate()?;
        Ok(Self {
            symbols: SymbolTable::new(),
            config,
            groups: RwLock::new(FxHashMap::default()),
        })
    }

    /// Replaces the symbol table; affects subsequent binds only.
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    /// The capture configuration this registry was built with.
    #[inline]
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Creates a new group.
    pub fn create(&self, id: GroupId) -> Result<Arc<Group>, GroupError> {
        let mut groups = self.groups.write();
        if groups.contains_key(&id.0) {
            return Err(GroupError::GroupExists(id.0));
        }
        let group = Arc::new(Group::new(id));
        groups.insert(id.0, Arc::clone(&group));
        debug!(group = id.0, "group created");
        Ok(group)
    }

    /// Looks up a group.
    pub fn get(&self, id: GroupId) -> Option<Arc<Group>> {
        self.groups.read().get(&id.0).cloned()
    }

    /// Drops the registry's reference to the group. In-flight holders
    /// keep it (and its last-held program) alive until they finish.
    pub fn destroy(&self, id: GroupId) -> Result<(), GroupError> {
        match self.groups.write().remove(&id.0) {
            Some(_) => {
                debug!(group = id.0, "group destroyed");
                Ok(())
            }
            None => Err(GroupError::UnknownGroup(id.0)),
        }
    }

    /// Validates and resolves `descriptor`, then installs it on the
    /// group.
    ///
    /// Rejection is atomic: on any [`BindError`](steer_lang::BindError)
    /// nothing is installed and a previously bound program keeps
    /// steering, unaffected.
    pub fn set_group_computation(
        &self,
        id: GroupId,
        descriptor: &ComputationDescriptor,
    ) -> Result<(), GroupError> {
        let group = self.get(id).ok_or(GroupError::UnknownGroup(id.0))?;

        let program = match resolve(descriptor, &self.symbols) {
            Ok(program) => program,
            Err(err) => {
                warn!(group = id.0, %err, "computation rejected");
                return Err(err.into());
            }
        };

        group.set_program(Arc::new(program));
        Ok(())
    }

    /// Adds a socket to a group's delivery mask.
    pub fn join(&self, id: GroupId, socket: SocketId) -> Result<(), GroupError> {
        self.get(id).ok_or(GroupError::UnknownGroup(id.0))?.join(socket)
    }

    /// Removes a socket from a group's delivery mask.
    pub fn leave(&self, id: GroupId, socket: SocketId) -> Result<(), GroupError> {
        self.get(id).ok_or(GroupError::UnknownGroup(id.0))?.leave(socket);
        Ok(())
    }
}
