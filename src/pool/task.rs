use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};

use super::result::TaskFailure;

/// Type-erased unit of work executed on a worker thread
pub(crate) type Job<T> = Box<dyn FnOnce() -> Result<T, TaskFailure> + Send + 'static>;

/// Description of one unit of work, built by the caller and handed to
/// [`DynamicTaskPool::add`](super::DynamicTaskPool::add).
///
/// Arguments are either captured by the target closure or passed explicitly
/// with [`Task::call`]. A tuple works for positional arguments and a plain
/// struct plays the role of named arguments:
///
/// ```rust
/// use taskman::Task;
///
/// struct Fetch {
///     url: String,
///     retries: u32,
/// }
///
/// fn fetch(req: Fetch) -> anyhow::Result<usize> {
///     Ok(req.url.len() * req.retries as usize)
/// }
///
/// let task: Task<usize, &str> = Task::call(fetch, Fetch { url: "https://example.com".into(), retries: 2 })
///     .weight(3)
///     .metadata("front page");
/// println!("{task:?}");
/// ```
pub struct Task<T, M = ()> {
    pub(crate) job: Job<T>,
    pub(crate) name: String,
    pub(crate) weight: u64,
    pub(crate) metadata: Option<M>,
}

impl<T, M> Task<T, M>
where
    T: Send + 'static,
{
    /// Task running a fallible target with no extra arguments
    pub fn new<F, E>(target: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let name = target_name::<F>();
        Self::from_job(name, Box::new(move || run_target(target)))
    }

    /// Task running `target(args)` on a worker
    pub fn call<F, A, E>(target: F, args: A) -> Self
    where
        F: FnOnce(A) -> Result<T, E> + Send + 'static,
        A: Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let name = target_name::<F>();
        Self::from_job(name, Box::new(move || run_target(move || target(args))))
    }

    /// Task running an infallible target. Panics are still captured.
    pub fn value<F>(target: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let name = target_name::<F>();
        Self::from_job(
            name,
            Box::new(move || run_target(move || Ok::<T, Infallible>(target()))),
        )
    }

    fn from_job(name: &str, job: Job<T>) -> Self {
        Self {
            job,
            name: name.to_string(),
            weight: 1,
            metadata: None,
        }
    }
}

impl<T, M> Task<T, M> {
    /// Override the display name (defaults to the target's function name)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Weight counted toward batch progress. Zero is treated as one.
    pub fn weight(mut self, weight: u64) -> Self {
        self.weight = weight.max(1);
        self
    }

    /// Opaque value handed back unchanged on the matching result
    pub fn metadata(mut self, metadata: M) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[cfg(test)]
    pub(crate) fn name_str(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn weight_value(&self) -> u64 {
        self.weight
    }
}

impl<T, M: std::fmt::Debug> std::fmt::Debug for Task<T, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// A task after `add`: sequenced and waiting in the pending list
pub(crate) struct WorkItem<T, M> {
    pub sequence: u64,
    pub name: String,
    pub weight: u64,
    pub metadata: Option<M>,
    pub job: Job<T>,
}

impl<T, M> WorkItem<T, M> {
    pub fn from_task(sequence: u64, task: Task<T, M>) -> Self {
        Self {
            sequence,
            name: task.name,
            weight: task.weight,
            metadata: task.metadata,
            job: task.job,
        }
    }
}

/// Run a target, converting both returned errors and panics into failures
fn run_target<T, E, F>(target: F) -> Result<T, TaskFailure>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<anyhow::Error> + 'static,
{
    match panic::catch_unwind(AssertUnwindSafe(target)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            let err: anyhow::Error = err.into();
            let kind = error_kind(std::any::type_name::<E>(), &err);
            Err(TaskFailure::from_error(&kind, err))
        }
        Err(payload) => Err(TaskFailure::from_panic(payload)),
    }
}

/// Failure kind for a target's error.
///
/// Concrete error types are named statically. Erased wrappers such as
/// `anyhow::Error` or `Box<dyn Error>` are named after their root cause,
/// read from the leading identifier of its `Debug` output.
fn error_kind(static_name: &str, err: &anyhow::Error) -> String {
    let erased = static_name == "anyhow::Error" || static_name.contains("<dyn ");
    if erased {
        let debug = format!("{:?}", err.root_cause());
        let ident: String = debug
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if ident.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return ident;
        }
    }
    short_type_name(static_name).to_string()
}

fn target_name<F>() -> &'static str {
    short_type_name(std::any::type_name::<F>())
}

/// `my_crate::module::scan_node::{{closure}}` -> `scan_node`
pub(crate) fn short_type_name(full: &str) -> &str {
    let mut path = full.split('<').next().unwrap_or(full);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_node() -> anyhow::Result<u32> {
        Ok(7)
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::scan_node"), "scan_node");
        assert_eq!(short_type_name("a::b::outer::{{closure}}"), "outer");
        assert_eq!(short_type_name("a::b::outer::{{closure}}::{{closure}}"), "outer");
        assert_eq!(short_type_name("a::generic<alloc::string::String>"), "generic");
        assert_eq!(short_type_name("plain"), "plain");
    }

    #[test]
    fn test_default_name_is_function_name() {
        let task: Task<u32> = Task::new(scan_node);
        assert_eq!(task.name_str(), "scan_node");
        assert_eq!(task.weight_value(), 1);
    }

    #[test]
    fn test_builder_overrides() {
        let task: Task<u32, &str> = Task::value(|| 1).name("custom").weight(0).metadata("m");
        assert_eq!(task.name_str(), "custom");
        assert_eq!(task.weight_value(), 1);
        assert_eq!(task.metadata, Some("m"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct ValueError(String);

    #[test]
    fn test_error_kind_for_concrete_type() {
        let err = anyhow::Error::new(ValueError("boom".into()));
        assert_eq!(error_kind(std::any::type_name::<ValueError>(), &err), "ValueError");
    }

    #[test]
    fn test_error_kind_for_erased_errors() {
        let anyhow_name = std::any::type_name::<anyhow::Error>();
        let err = anyhow::Error::new(ValueError("boom".into())).context("while fetching");
        assert_eq!(error_kind(anyhow_name, &err), "ValueError");

        // Ad-hoc messages have no type of their own
        assert_eq!(error_kind(anyhow_name, &anyhow::anyhow!("plain")), "Error");

        let boxed_name =
            std::any::type_name::<Box<dyn std::error::Error + Send + Sync>>();
        let err = anyhow::Error::new(ValueError("boxed".into()));
        assert_eq!(error_kind(boxed_name, &err), "ValueError");
    }

    #[test]
    fn test_job_captures_panic() {
        let task: Task<u32> = Task::value(|| panic!("kaboom"));
        let failure = (task.job)().unwrap_err();
        assert_eq!(failure.kind, "panic");
        assert_eq!(failure.message, "kaboom");
    }

    #[test]
    fn test_call_passes_arguments() {
        let task: Task<usize> = Task::call(
            |(a, b): (usize, usize)| Ok::<_, std::io::Error>(a + b),
            (2, 3),
        );
        assert_eq!((task.job)().unwrap(), 5);
    }
}
