//! Lazy cross product of methods × hosts × ports

use std::sync::Arc;

use bugscan_common::ProbeTask;

/// Pull-based task generator.
///
/// Yields one `ProbeTask` per (method, host, port) combination, with the
/// method as the outermost loop and the port as the innermost. Methods are
/// upper-cased as tasks are emitted. Nothing is skipped or deduplicated,
/// and no task is built before it is pulled.
///
/// Cloning is cheap (the inputs are shared) and the clone keeps the
/// current cursor; `restart` rewinds to the first task.
#[derive(Debug, Clone)]
pub struct TaskList {
    methods: Arc<[String]>,
    hosts: Arc<[String]>,
    ports: Arc<[u16]>,
    method_idx: usize,
    host_idx: usize,
    port_idx: usize,
}

impl TaskList {
    pub fn new(
        methods: impl Into<Arc<[String]>>,
        hosts: impl Into<Arc<[String]>>,
        ports: impl Into<Arc<[u16]>>,
    ) -> Self {
        Self {
            methods: methods.into(),
            hosts: hosts.into(),
            ports: ports.into(),
            method_idx: 0,
            host_idx: 0,
            port_idx: 0,
        }
    }

    /// Size of the full cross product.
    pub fn total(&self) -> u64 {
        self.methods.len() as u64 * self.hosts.len() as u64 * self.ports.len() as u64
    }

    /// Tasks not yet pulled.
    pub fn remaining(&self) -> u64 {
        if self.is_exhausted() {
            return 0;
        }
        let h = self.hosts.len() as u64;
        let p = self.ports.len() as u64;
        let consumed = (self.method_idx as u64 * h + self.host_idx as u64) * p + self.port_idx as u64;
        self.total() - consumed
    }

    /// Rewind to the first task.
    pub fn restart(&mut self) {
        self.method_idx = 0;
        self.host_idx = 0;
        self.port_idx = 0;
    }

    fn is_exhausted(&self) -> bool {
        self.hosts.is_empty() || self.ports.is_empty() || self.method_idx >= self.methods.len()
    }

    fn advance(&mut self) {
        self.port_idx += 1;
        if self.port_idx == self.ports.len() {
            self.port_idx = 0;
            self.host_idx += 1;
            if self.host_idx == self.hosts.len() {
                self.host_idx = 0;
                self.method_idx += 1;
            }
        }
    }
}

impl Iterator for TaskList {
    type Item = ProbeTask;

    fn next(&mut self) -> Option<ProbeTask> {
        if self.is_exhausted() {
            return None;
        }
        let task = ProbeTask {
            method: self.methods[self.method_idx].to_uppercase(),
            host: self.hosts[self.host_idx].clone(),
            port: self.ports[self.port_idx],
        };
        self.advance();
        Some(task)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn yields_full_cross_product() {
        let list = TaskList::new(
            strings(&["head", "get"]),
            strings(&["a.com", "b.com", "c.com"]),
            vec![80, 443],
        );
        assert_eq!(list.total(), 12);
        assert_eq!(list.remaining(), 12);
        assert_eq!(list.count(), 12);
    }

    #[test]
    fn nesting_order_is_method_host_port() {
        let tasks: Vec<ProbeTask> = TaskList::new(
            strings(&["head", "get"]),
            strings(&["a", "b"]),
            vec![80, 8080],
        )
        .collect();

        let expected = vec![
            ProbeTask::new("HEAD", "a", 80),
            ProbeTask::new("HEAD", "a", 8080),
            ProbeTask::new("HEAD", "b", 80),
            ProbeTask::new("HEAD", "b", 8080),
            ProbeTask::new("GET", "a", 80),
            ProbeTask::new("GET", "a", 8080),
            ProbeTask::new("GET", "b", 80),
            ProbeTask::new("GET", "b", 8080),
        ];
        assert_eq!(tasks, expected);
    }

    #[test]
    fn duplicates_are_kept() {
        let tasks: Vec<ProbeTask> =
            TaskList::new(strings(&["head"]), strings(&["a", "a"]), vec![80, 80]).collect();
        assert_eq!(tasks.len(), 4);
        assert!(tasks.iter().all(|t| *t == ProbeTask::new("HEAD", "a", 80)));
    }

    #[test]
    fn empty_dimension_yields_nothing() {
        assert_eq!(TaskList::new(strings(&[]), strings(&["a"]), vec![80]).count(), 0);
        assert_eq!(TaskList::new(strings(&["head"]), strings(&[]), vec![80]).count(), 0);
        assert_eq!(TaskList::new(strings(&["head"]), strings(&["a"]), vec![]).count(), 0);
        assert_eq!(TaskList::new(strings(&["head"]), strings(&[]), vec![80]).remaining(), 0);
    }

    #[test]
    fn remaining_tracks_cursor_and_restart_rewinds() {
        let mut list = TaskList::new(strings(&["head", "get"]), strings(&["a", "b"]), vec![80, 81, 82]);
        for _ in 0..7 {
            list.next();
        }
        assert_eq!(list.remaining(), 5);
        assert_eq!(list.size_hint(), (5, Some(5)));
        assert_eq!(list.next(), Some(ProbeTask::new("GET", "a", 81)));

        list.restart();
        assert_eq!(list.remaining(), 12);
        assert_eq!(list.next(), Some(ProbeTask::new("HEAD", "a", 80)));
    }

    #[test]
    fn large_host_list_is_not_materialized() {
        let hosts: Vec<String> = (0..65_534u32).map(|i| format!("10.0.{}.{}", i / 256, i % 256)).collect();
        let mut list = TaskList::new(strings(&["head", "get", "options"]), hosts, vec![80, 443, 8080]);
        assert_eq!(list.total(), 3 * 65_534 * 3);
        assert_eq!(list.nth(3 * 65_534), Some(ProbeTask::new("GET", "10.0.0.0", 80)));
    }
}
