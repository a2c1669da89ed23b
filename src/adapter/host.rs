//! Reference host: records groups, hooks and tests, then runs them.
//!
//! Stands in for a host test framework wherever none is available. The
//! execution order is configurable so callers can exercise checks arriving
//! interleaved across factors, the way an asynchronous host would deliver
//! them.

use super::{Hook, TestBody, TestHost};
use crate::error::{ParityError, ParityResult};
use tracing::{debug, debug_span, warn};

/// Order in which recorded tests are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionOrder {
    /// Group by group, tests in registration order.
    #[default]
    Sequential,
    /// Round-robin: the first test of every group, then the second, ...
    Interleaved,
    /// Groups last-to-first, tests in registration order.
    Reversed,
}

struct Group<'s> {
    name: String,
    parent: Option<usize>,
    before_all: Vec<Hook<'s>>,
    before_each: Vec<Hook<'s>>,
    tests: Vec<(String, TestBody<'s>)>,
}

impl<'s> Group<'s> {
    fn new(name: String, parent: Option<usize>) -> Self {
        Self {
            name,
            parent,
            before_all: Vec::new(),
            before_each: Vec::new(),
            tests: Vec::new(),
        }
    }
}

/// A minimal host that records registrations and runs them on demand.
///
/// Hooks apply to every test of the group they were registered in,
/// including tests of nested groups. Before a test runs, `before_all` hooks
/// that have not yet run and then every `before_each` hook fire, outermost
/// group first. Nested groups get `"outer > inner"` names. Registrations
/// made outside any group go to an unnamed root group enclosing all others.
pub struct ScheduledHost<'s> {
    groups: Vec<Group<'s>>,
    stack: Vec<usize>,
    order: ExecutionOrder,
}

const ROOT: usize = 0;

impl<'s> ScheduledHost<'s> {
    /// Host running tests sequentially.
    pub fn new() -> Self {
        Self::with_order(ExecutionOrder::Sequential)
    }

    /// Host running tests in the given order.
    pub fn with_order(order: ExecutionOrder) -> Self {
        Self {
            groups: vec![Group::new(String::new(), None)],
            stack: Vec::new(),
            order,
        }
    }

    /// Number of registered tests.
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.tests.len()).sum()
    }

    fn current_index(&self) -> usize {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    fn current(&mut self) -> &mut Group<'s> {
        let index = self.current_index();
        &mut self.groups[index]
    }

    /// `group` and its ancestors, outermost first.
    fn lineage(&self, group: usize) -> Vec<usize> {
        let mut chain = vec![group];
        let mut cursor = self.groups[group].parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.groups[parent].parent;
        }
        chain.reverse();
        chain
    }

    fn schedule(&self) -> Vec<(usize, usize)> {
        let counts: Vec<usize> = self.groups.iter().map(|g| g.tests.len()).collect();
        let counts = &counts;
        match self.order {
            ExecutionOrder::Sequential => (0..counts.len())
                .flat_map(|g| (0..counts[g]).map(move |t| (g, t)))
                .collect(),
            ExecutionOrder::Reversed => (0..counts.len())
                .rev()
                .flat_map(|g| (0..counts[g]).map(move |t| (g, t)))
                .collect(),
            ExecutionOrder::Interleaved => {
                let rounds = counts.iter().copied().max().unwrap_or(0);
                (0..rounds)
                    .flat_map(|t| {
                        (0..counts.len())
                            .filter(move |&g| t < counts[g])
                            .map(move |g| (g, t))
                    })
                    .collect()
            }
        }
    }

    /// Run every recorded test and report the outcomes.
    pub fn run(mut self) -> HostReport {
        let schedule = self.schedule();
        let mut bodies: Vec<Vec<Option<(String, TestBody<'s>)>>> = self
            .groups
            .iter_mut()
            .map(|g| g.tests.drain(..).map(Some).collect())
            .collect();
        let mut started = vec![false; self.groups.len()];
        let mut report = HostReport::default();

        for (g, t) in schedule {
            let lineage = self.lineage(g);
            for &a in &lineage {
                if !started[a] {
                    started[a] = true;
                    for hook in self.groups[a].before_all.iter_mut() {
                        hook();
                    }
                }
            }
            for &a in &lineage {
                for hook in self.groups[a].before_each.iter_mut() {
                    hook();
                }
            }

            let Some((name, body)) = bodies[g][t].take() else {
                continue;
            };
            let group = &self.groups[g];
            let _span = debug_span!("test", group = %group.name, test = %name).entered();
            let result = body();
            match &result {
                Ok(()) => debug!("test passed"),
                Err(e) => warn!(error = %e, "test failed"),
            }
            report.record(TestOutcome {
                group: group.name.clone(),
                name,
                result,
            });
        }

        report
    }
}

impl Default for ScheduledHost<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s> TestHost<'s> for ScheduledHost<'s> {
    fn group<F>(&mut self, name: &str, body: F)
    where
        F: FnOnce(&mut Self),
    {
        let parent = self.current_index();
        let full_name = match self.stack.last() {
            Some(_) => format!("{} > {}", self.groups[parent].name, name),
            None => name.to_string(),
        };
        self.groups.push(Group::new(full_name, Some(parent)));
        self.stack.push(self.groups.len() - 1);
        body(self);
        self.stack.pop();
    }

    fn before_all(&mut self, hook: Hook<'s>) {
        self.current().before_all.push(hook);
    }

    fn before_each(&mut self, hook: Hook<'s>) {
        self.current().before_each.push(hook);
    }

    fn test(&mut self, name: &str, body: TestBody<'s>) {
        self.current().tests.push((name.to_string(), body));
    }
}

/// Outcome of one executed test.
#[derive(Debug)]
pub struct TestOutcome {
    /// Group name.
    pub group: String,
    /// Test name.
    pub name: String,
    /// What the test body returned.
    pub result: ParityResult<()>,
}

impl TestOutcome {
    /// Returns true if the test passed.
    pub fn is_pass(&self) -> bool {
        self.result.is_ok()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&ParityError> {
        self.result.as_ref().err()
    }
}

/// Results from running a [`ScheduledHost`].
#[derive(Debug, Default)]
pub struct HostReport {
    /// Number of tests that passed.
    pub passed: usize,
    /// Number of tests that failed.
    pub failed: usize,
    /// Every outcome, in execution order.
    pub outcomes: Vec<TestOutcome>,
}

impl HostReport {
    /// Record an outcome.
    pub fn record(&mut self, outcome: TestOutcome) {
        if outcome.is_pass() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Total number of tests run.
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Returns true if no test failed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Failed outcomes only.
    pub fn failures(&self) -> Vec<&TestOutcome> {
        self.outcomes.iter().filter(|o| !o.is_pass()).collect()
    }

    /// Format a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed (total: {})",
            self.passed,
            self.failed,
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn trace_host(order: ExecutionOrder) -> Vec<String> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut host = ScheduledHost::with_order(order);
        for group in ["A", "B"] {
            let log = Rc::clone(&log);
            host.group(group, |host| {
                let l = Rc::clone(&log);
                host.before_all(Box::new(move || l.borrow_mut().push(format!("{group}:all"))));
                let l = Rc::clone(&log);
                host.before_each(Box::new(move || l.borrow_mut().push(format!("{group}:each"))));
                for test in 0..2 {
                    let l = Rc::clone(&log);
                    host.test(
                        &format!("t{test}"),
                        Box::new(move || {
                            l.borrow_mut().push(format!("{group}:t{test}"));
                            Ok(())
                        }),
                    );
                }
            });
        }
        let report = host.run();
        assert_eq!(report.passed, 4);
        let entries = log.borrow().clone();
        entries
    }

    #[test]
    fn test_sequential_order_and_hooks() {
        assert_eq!(
            trace_host(ExecutionOrder::Sequential),
            vec![
                "A:all", "A:each", "A:t0", "A:each", "A:t1", "B:all", "B:each", "B:t0", "B:each",
                "B:t1"
            ]
        );
    }

    #[test]
    fn test_interleaved_order() {
        let tests: Vec<String> = trace_host(ExecutionOrder::Interleaved)
            .into_iter()
            .filter(|e| e.contains(":t"))
            .collect();
        assert_eq!(tests, vec!["A:t0", "B:t0", "A:t1", "B:t1"]);
    }

    #[test]
    fn test_reversed_order() {
        let tests: Vec<String> = trace_host(ExecutionOrder::Reversed)
            .into_iter()
            .filter(|e| e.contains(":t"))
            .collect();
        assert_eq!(tests, vec!["B:t0", "B:t1", "A:t0", "A:t1"]);
    }

    #[test]
    fn test_enclosing_group_hooks_run_for_nested_tests() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut host = ScheduledHost::new();
        let push = |entry: &'static str| {
            let l = Rc::clone(&log);
            Box::new(move || l.borrow_mut().push(entry.to_string())) as Hook<'static>
        };
        host.before_each(push("root:each"));
        host.group("outer", |host| {
            host.before_all(push("outer:all"));
            host.before_each(push("outer:each"));
            host.group("inner", |host| {
                host.before_each(push("inner:each"));
                host.test("t0", Box::new(|| Ok(())));
                host.test("t1", Box::new(|| Ok(())));
            });
        });

        let report = host.run();
        assert_eq!(report.passed, 2);
        assert_eq!(report.outcomes[0].group, "outer > inner");
        assert_eq!(
            *log.borrow(),
            vec![
                "outer:all",
                "root:each",
                "outer:each",
                "inner:each",
                "root:each",
                "outer:each",
                "inner:each"
            ]
        );
    }

    #[test]
    fn test_failures_and_nested_names() {
        let mut host = ScheduledHost::new();
        host.test("root", Box::new(|| Ok(())));
        host.group("outer", |host| {
            host.group("inner", |host| {
                host.test("boom", Box::new(|| Err(ParityError::NoFactors)));
            });
        });
        assert_eq!(host.test_count(), 2);

        let report = host.run();
        assert_eq!(report.summary(), "1 passed, 1 failed (total: 2)");
        assert!(!report.all_passed());
        let failures = report.failures();
        assert_eq!(failures[0].group, "outer > inner");
        assert!(matches!(failures[0].error(), Some(ParityError::NoFactors)));
    }
}
