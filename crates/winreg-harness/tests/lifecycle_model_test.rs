//! Model-based property tests for scoped key handles.
//!
//! Random sequences of key scopes run against the simulated service and
//! against a reference model of what the service should observe.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<ScopePlan>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!       ModelWorld    RegistryClient   Compare
//!       (reference)   + SimTransport   outcomes and ledger
//! ```

use proptest::prelude::*;
use winreg_core::{RegistryClient, RegistryError};
use winreg_harness::SimTransport;
use winreg_proto::{Opnum, PredefinedKey, Regsam, ReturnCode};

/// One key scope and the faults injected around it.
#[derive(Debug, Clone)]
struct ScopePlan {
    open_fails: bool,
    queries: u8,
    body_fails: bool,
    close_fails: bool,
}

fn scope_plan() -> impl Strategy<Value = ScopePlan> {
    (any::<bool>(), 0u8..4, any::<bool>(), any::<bool>()).prop_map(
        |(open_fails, queries, body_fails, close_fails)| ScopePlan {
            open_fails,
            // A failing body fails on its first query.
            queries: if body_fails { queries.max(1) } else { queries },
            body_fails,
            close_fails,
        },
    )
}

/// What a scope is expected to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok(u8),
    Failed(Opnum, ReturnCode),
}

impl Outcome {
    fn of(result: &Result<u8, RegistryError>) -> Self {
        match result {
            Ok(queries) => Self::Ok(*queries),
            Err(RegistryError::OperationFailed { opnum, code }) => Self::Failed(*opnum, *code),
            Err(other) => panic!("unexpected error kind: {other}"),
        }
    }
}

/// Reference model of the service's view.
#[derive(Debug, Default)]
struct ModelWorld {
    opened: usize,
    closes_sent: usize,
    leaked: usize,
}

impl ModelWorld {
    fn apply(&mut self, plan: &ScopePlan) -> Outcome {
        if plan.open_fails {
            return Outcome::Failed(Opnum::BaseRegOpenKey, ReturnCode::ACCESS_DENIED);
        }
        self.opened += 1;
        self.closes_sent += 1;
        if plan.close_fails {
            self.leaked += 1;
        }
        match (plan.body_fails, plan.close_fails) {
            (true, _) => Outcome::Failed(Opnum::BaseRegGetVersion, ReturnCode::ACCESS_DENIED),
            (false, true) => Outcome::Failed(Opnum::BaseRegCloseKey, ReturnCode::INVALID_HANDLE),
            (false, false) => Outcome::Ok(plan.queries),
        }
    }
}

async fn run_scope(
    client: &RegistryClient<SimTransport>,
    root: winreg_proto::KeyHandle,
    plan: &ScopePlan,
) -> Result<u8, RegistryError> {
    let sim = client.transport();
    if plan.open_fails {
        sim.fail_next(Opnum::BaseRegOpenKey, ReturnCode::ACCESS_DENIED);
    } else {
        if plan.body_fails {
            sim.fail_next(Opnum::BaseRegGetVersion, ReturnCode::ACCESS_DENIED);
        }
        if plan.close_fails {
            sim.fail_next(Opnum::BaseRegCloseKey, ReturnCode::INVALID_HANDLE);
        }
    }

    client
        .with_sub_key(root, "SOFTWARE", Regsam::KEY_READ, |opened| async move {
            for _ in 0..plan.queries {
                client.get_version(opened.key_handle).await?;
            }
            Ok(plan.queries)
        })
        .await
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scopes_close_exactly_what_they_open(
        seed in any::<u64>(),
        plans in prop::collection::vec(scope_plan(), 1..12),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let client = RegistryClient::new(SimTransport::with_seed(seed));
        let mut model = ModelWorld::default();

        let root = runtime
            .block_on(client.open_predefined_key(PredefinedKey::LocalMachine, Regsam::KEY_READ))
            .unwrap()
            .key_handle;

        for plan in &plans {
            let expected = model.apply(plan);
            let actual = Outcome::of(&runtime.block_on(run_scope(&client, root, plan)));
            prop_assert_eq!(actual, expected, "plan {:?}", plan);
        }

        let sim = client.transport();
        prop_assert_eq!(sim.calls_to(Opnum::BaseRegCloseKey).len(), model.closes_sent);
        prop_assert_eq!(sim.closed_handles().len(), model.opened - model.leaked);
        // The root handle stays open alongside every leaked sub-key.
        prop_assert_eq!(sim.open_handles().len(), model.leaked + 1);
        prop_assert!(sim.lifecycle_violations().is_empty());
    }

    #[test]
    fn every_close_names_the_handle_its_scope_opened(
        seed in any::<u64>(),
        scopes in 1usize..8,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let client = RegistryClient::new(SimTransport::with_seed(seed));

        let root = runtime
            .block_on(client.open_predefined_key(PredefinedKey::Users, Regsam::KEY_READ))
            .unwrap()
            .key_handle;

        let mut seen = Vec::new();
        for _ in 0..scopes {
            let handle = runtime
                .block_on(client.with_sub_key(root, ".DEFAULT", Regsam::KEY_READ, |opened| async move {
                    Ok(opened.key_handle)
                }))
                .unwrap();
            seen.push(handle);
        }

        prop_assert_eq!(client.transport().closed_handles(), seen);
        prop_assert_eq!(client.transport().open_handles(), vec![root]);
    }
}
