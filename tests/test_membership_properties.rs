//! Property tests for list membership and whitelist precedence

use procguard::models::{ActuatorError, ListKind, ProcessEntry};
use procguard::monitor::{run_iteration, select_targets};
use procguard::process::ProcessActuator;
use procguard::store::{ListSnapshot, MembershipStore};
use proptest::prelude::*;
use std::sync::Mutex;

/// Fixed process table; records termination attempts
struct TableActuator {
    processes: Vec<ProcessEntry>,
    attempts: Mutex<Vec<u32>>,
}

impl ProcessActuator for TableActuator {
    fn list_processes(&self) -> Vec<ProcessEntry> {
        self.processes.clone()
    }

    fn terminate(&self, pid: u32) -> Result<(), ActuatorError> {
        self.attempts.lock().unwrap().push(pid);
        Ok(())
    }

    fn set_high_priority(&self, _pid: u32) -> Result<(), ActuatorError> {
        Ok(())
    }
}

fn process_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,24}"
}

fn process_table() -> impl Strategy<Value = Vec<ProcessEntry>> {
    prop::collection::vec(process_name(), 0..12).prop_map(|names| {
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| ProcessEntry::new(100 + i as u32, name))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn add_twice_reports_new_then_duplicate(name in "[A-Za-z0-9_. -]{0,24}".prop_filter("blank", |n| !n.trim().is_empty())) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MembershipStore::new(dir.path().join("lists.json"));

        prop_assert!(store.add(ListKind::Blacklist, &name).unwrap());
        prop_assert!(!store.add(ListKind::Blacklist, &name).unwrap());
        prop_assert_eq!(store.list(ListKind::Blacklist).len(), 1);
    }

    #[test]
    fn remove_absent_leaves_list_unchanged(
        present in prop::collection::vec(process_name(), 0..6),
        absent in process_name(),
    ) {
        prop_assume!(!present.contains(&absent));
        let dir = tempfile::tempdir().unwrap();
        let mut store = MembershipStore::new(dir.path().join("lists.json"));
        for name in &present {
            store.add(ListKind::Whitelist, name).unwrap();
        }
        let before: Vec<String> = store.list(ListKind::Whitelist).iter().map(str::to_string).collect();

        prop_assert!(!store.remove(ListKind::Whitelist, &absent).unwrap());
        let after: Vec<String> = store.list(ListKind::Whitelist).iter().map(str::to_string).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn whitelisted_name_is_never_terminated(
        protected in process_name(),
        others in prop::collection::vec(process_name(), 0..6),
        mut table in process_table(),
    ) {
        table.push(ProcessEntry::new(1, protected.clone()));
        let mut blacklist = others.clone();
        blacklist.push(protected.clone());
        let lists = ListSnapshot::new(blacklist, [protected.clone()]);

        let actuator = TableActuator { processes: table.clone(), attempts: Mutex::new(Vec::new()) };
        let report = run_iteration(&actuator, &lists);

        let attempts = actuator.attempts.lock().unwrap().clone();
        for process in table.iter().filter(|p| p.name == protected) {
            prop_assert!(!attempts.contains(&process.pid));
        }
        prop_assert!(report.terminated.iter().all(|p| p.name != protected));
    }

    #[test]
    fn selection_matches_blacklist_minus_whitelist(
        blacklist in prop::collection::vec(process_name(), 0..6),
        whitelist in prop::collection::vec(process_name(), 0..6),
        table in process_table(),
    ) {
        let lists = ListSnapshot::new(blacklist.clone(), whitelist.clone());
        let selected = select_targets(&table, &lists);

        let expected: Vec<ProcessEntry> = table
            .into_iter()
            .filter(|p| blacklist.contains(&p.name) && !whitelist.contains(&p.name))
            .collect();
        prop_assert_eq!(selected, expected);
    }
}
