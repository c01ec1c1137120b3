//! The host: module address space and serialized, all-or-nothing invocation.
//!
//! Each module sits in its own `RefCell`. A call borrows its target mutably
//! for the whole call; any attempt to reach that module again further down
//! the call stack finds it borrowed and fails with `Reentrant` instead of
//! observing intermediate state.

use crate::module::Module;
use agora_types::{Address, GovernanceError};
use std::cell::RefCell;
use std::collections::HashMap;

/// A deployed module. Whether it accepts dispatch is fixed at deploy time,
/// so the check never needs to borrow the module.
struct Slot {
    executable: bool,
    cell: Box<RefCell<dyn Module>>,
}

/// In-process hosting environment.
pub struct Host {
    modules: HashMap<Address, Slot>,
    /// Next deployment nonce per deployer.
    nonces: HashMap<Address, u64>,
}

impl Host {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            nonces: HashMap::new(),
        }
    }

    /// Deploy `module` on behalf of `deployer` and return its address.
    pub fn deploy<M: Module + 'static>(&mut self, deployer: &Address, module: M) -> Address {
        let nonce = self.nonces.entry(*deployer).or_insert(0);
        let address = Address::derive(deployer, *nonce);
        *nonce += 1;
        tracing::info!(%deployer, module = %address, kind = module.kind(), "module deployed");
        let slot = Slot {
            executable: module.is_executable(),
            cell: Box::new(RefCell::new(module)),
        };
        self.modules.insert(address, slot);
        address
    }

    /// Whether any module lives at `address`.
    pub fn contains(&self, address: &Address) -> bool {
        self.modules.contains_key(address)
    }

    /// Number of deployed modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Run a state-changing call from `caller` against the module at `target`.
    ///
    /// The call executes to completion. If it returns an error, every module
    /// is restored to its state from before the call. A module that cannot
    /// reload its snapshot turns the call's error into the restore error.
    pub fn transact<M, R, F>(
        &self,
        caller: &Address,
        target: &Address,
        f: F,
    ) -> Result<R, GovernanceError>
    where
        M: Module + 'static,
        F: FnOnce(&mut M, &Context<'_>) -> Result<R, GovernanceError>,
    {
        let snapshot = self.snapshot()?;
        let ctx = Context {
            host: self,
            caller: *caller,
            this: *target,
        };
        let result = ctx.enter(f);
        if let Err(err) = &result {
            tracing::warn!(%caller, %target, error = %err, "transaction reverted");
            self.restore(snapshot)?;
        }
        result
    }

    /// Read the module at `target` without changing any state.
    pub fn query<M, R, F>(&self, target: &Address, f: F) -> Result<R, GovernanceError>
    where
        M: Module + 'static,
        F: FnOnce(&M) -> R,
    {
        read(self, target, f)
    }

    fn slot(&self, address: &Address) -> Result<&Slot, GovernanceError> {
        self.modules
            .get(address)
            .ok_or(GovernanceError::IncompatibleModule(*address))
    }

    fn snapshot(&self) -> Result<Vec<(Address, Vec<u8>)>, GovernanceError> {
        self.modules
            .iter()
            .map(|(address, slot)| {
                let module = slot
                    .cell
                    .try_borrow()
                    .map_err(|_| GovernanceError::Reentrant(*address))?;
                Ok((*address, module.save_state()?))
            })
            .collect()
    }

    /// Reload every module from `snapshot`. All modules are attempted; the
    /// first failure is returned.
    fn restore(&self, snapshot: Vec<(Address, Vec<u8>)>) -> Result<(), GovernanceError> {
        let mut first = None;
        for (address, state) in snapshot {
            let Some(slot) = self.modules.get(&address) else {
                continue;
            };
            if let Err(e) = slot.cell.borrow_mut().load_state(&state) {
                tracing::error!(module = %address, error = %e, "failed to restore module state");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

/// What a module sees while one of its entry points runs.
pub struct Context<'h> {
    host: &'h Host,
    caller: Address,
    this: Address,
}

impl<'h> Context<'h> {
    /// The principal that invoked the current entry point.
    pub fn caller(&self) -> &Address {
        &self.caller
    }

    /// The address of the module whose entry point is running.
    pub fn this(&self) -> &Address {
        &self.this
    }

    /// Read another module. Fails with `Reentrant` if it is part of the
    /// current call stack, `IncompatibleModule` if it is not an `M`.
    pub fn read<M, R, F>(&self, target: &Address, f: F) -> Result<R, GovernanceError>
    where
        M: Module + 'static,
        F: FnOnce(&M) -> R,
    {
        read(self.host, target, f)
    }

    /// Whether `target` is a deployed module exposing generic dispatch.
    pub fn is_executable(&self, target: &Address) -> bool {
        self.host
            .modules
            .get(target)
            .is_some_and(|slot| slot.executable)
    }

    /// Invoke `target.execute(operation, payload)` with the current module as caller.
    pub fn dispatch(
        &self,
        target: &Address,
        operation: &str,
        payload: &[u8],
    ) -> Result<(), GovernanceError> {
        let slot = self.host.slot(target)?;
        if !slot.executable {
            return Err(GovernanceError::IncompatibleModule(*target));
        }
        let mut module = slot
            .cell
            .try_borrow_mut()
            .map_err(|_| GovernanceError::Reentrant(*target))?;
        tracing::debug!(caller = %self.this, %target, operation, "dispatching");
        let inner = Context {
            host: self.host,
            caller: self.this,
            this: *target,
        };
        module.execute(&inner, operation, payload)
    }

    fn enter<M, R, F>(&self, f: F) -> Result<R, GovernanceError>
    where
        M: Module + 'static,
        F: FnOnce(&mut M, &Context<'_>) -> Result<R, GovernanceError>,
    {
        let slot = self.host.slot(&self.this)?;
        let mut guard = slot
            .cell
            .try_borrow_mut()
            .map_err(|_| GovernanceError::Reentrant(self.this))?;
        let module: &mut dyn Module = &mut *guard;
        let module = module
            .as_any_mut()
            .downcast_mut::<M>()
            .ok_or(GovernanceError::IncompatibleModule(self.this))?;
        f(module, self)
    }
}

fn read<M, R, F>(host: &Host, target: &Address, f: F) -> Result<R, GovernanceError>
where
    M: Module + 'static,
    F: FnOnce(&M) -> R,
{
    let slot = host.slot(target)?;
    let guard = slot
        .cell
        .try_borrow()
        .map_err(|_| GovernanceError::Reentrant(*target))?;
    let module: &dyn Module = &*guard;
    let module = module
        .as_any()
        .downcast_ref::<M>()
        .ok_or(GovernanceError::IncompatibleModule(*target))?;
    Ok(f(module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{decode_state, encode_state};
    use agora_types::payload;
    use serde::{Deserialize, Serialize};

    #[derive(Default, Serialize, Deserialize)]
    struct Counter {
        value: u64,
    }

    impl Module for Counter {
        fn kind(&self) -> &'static str {
            "Counter"
        }

        fn is_executable(&self) -> bool {
            true
        }

        fn execute(
            &mut self,
            _ctx: &Context<'_>,
            operation: &str,
            data: &[u8],
        ) -> Result<(), GovernanceError> {
            match operation {
                "add" => {
                    self.value += payload::decode::<u64>(operation, data)?;
                    Ok(())
                }
                _ => Err(GovernanceError::OperationNotFound {
                    module: "Counter",
                    operation: operation.to_string(),
                }),
            }
        }

        fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
            encode_state(self)
        }

        fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError> {
            *self = decode_state(data)?;
            Ok(())
        }
    }

    #[derive(Default, Serialize, Deserialize)]
    struct Relay;

    impl Module for Relay {
        fn kind(&self) -> &'static str {
            "Relay"
        }

        fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
            encode_state(self)
        }

        fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError> {
            *self = decode_state(data)?;
            Ok(())
        }
    }

    /// Snapshots fine, never reloads.
    #[derive(Default)]
    struct Brittle;

    impl Module for Brittle {
        fn kind(&self) -> &'static str {
            "Brittle"
        }

        fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
            Ok(Vec::new())
        }

        fn load_state(&mut self, _data: &[u8]) -> Result<(), GovernanceError> {
            Err(GovernanceError::Codec("unreadable snapshot".into()))
        }
    }

    fn alice() -> Address {
        Address::new([1; 20])
    }

    #[test]
    fn deploy_assigns_distinct_addresses() {
        let mut host = Host::new();
        let a = host.deploy(&alice(), Counter::default());
        let b = host.deploy(&alice(), Counter::default());
        assert_ne!(a, b);
        assert_eq!(host.len(), 2);
        assert!(host.contains(&a));
    }

    #[test]
    fn failed_transaction_rolls_back_every_module() {
        let mut host = Host::new();
        let counter = host.deploy(&alice(), Counter::default());
        let relay = host.deploy(&alice(), Relay);

        let result: Result<(), _> = host.transact(&alice(), &relay, |_: &mut Relay, ctx| {
            ctx.dispatch(&counter, "add", &payload::encode(&5u64).unwrap())?;
            Err(GovernanceError::Config("late failure".into()))
        });
        assert!(result.is_err());
        assert_eq!(host.query(&counter, |c: &Counter| c.value).unwrap(), 0);

        host.transact(&alice(), &relay, |_: &mut Relay, ctx| {
            ctx.dispatch(&counter, "add", &payload::encode(&5u64).unwrap())
        })
        .unwrap();
        assert_eq!(host.query(&counter, |c: &Counter| c.value).unwrap(), 5);
    }

    #[test]
    fn dispatch_rejects_modules_without_entry_point() {
        let mut host = Host::new();
        let counter = host.deploy(&alice(), Counter::default());
        let relay = host.deploy(&alice(), Relay);
        let err = host
            .transact(&alice(), &counter, |_: &mut Counter, ctx| {
                ctx.dispatch(&relay, "add", &[])
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::IncompatibleModule(relay));

        let nowhere = Address::new([9; 20]);
        let err = host
            .transact(&alice(), &counter, |_: &mut Counter, ctx| {
                ctx.dispatch(&nowhere, "add", &[])
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::IncompatibleModule(nowhere));
    }

    #[test]
    fn dispatch_into_running_module_is_reentrant() {
        let mut host = Host::new();
        let counter = host.deploy(&alice(), Counter::default());
        let err = host
            .transact(&alice(), &counter, |_: &mut Counter, ctx| {
                ctx.dispatch(&counter, "add", &payload::encode(&1u64).unwrap())
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::Reentrant(counter));
    }

    #[test]
    fn capability_is_checked_before_reentrancy() {
        let mut host = Host::new();
        let relay = host.deploy(&alice(), Relay);
        let err = host
            .transact(&alice(), &relay, |_: &mut Relay, ctx| {
                assert!(!ctx.is_executable(&relay));
                ctx.dispatch(&relay, "add", &[])
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::IncompatibleModule(relay));
    }

    #[test]
    fn failed_restore_is_reported() {
        let mut host = Host::new();
        let counter = host.deploy(&alice(), Counter::default());
        let brittle = host.deploy(&alice(), Brittle);
        let err = host
            .transact(&alice(), &counter, |c: &mut Counter, _| {
                c.value = 7;
                Err::<(), _>(GovernanceError::Config("late failure".into()))
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::Codec("unreadable snapshot".into()));
        // Modules that can reload still do.
        assert_eq!(host.query(&counter, |c: &Counter| c.value).unwrap(), 0);
        assert!(host.contains(&brittle));
    }

    #[test]
    fn typed_access_checks_module_kind() {
        let mut host = Host::new();
        let relay = host.deploy(&alice(), Relay);
        let err = host.query(&relay, |c: &Counter| c.value).unwrap_err();
        assert_eq!(err, GovernanceError::IncompatibleModule(relay));
    }
}
