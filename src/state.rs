/// Whether remote calls should actually happen—an outer enum to make sure that dry-runs are
/// handled appropriately everywhere the Gitea API would be touched.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RunType<T> {
    /// Signifies that this is a dry run. No network I/O should happen—just pretend to publish
    /// and log what would have been sent.
    DryRun(T),
    /// This is a real run, actually do the thing.
    Real(T),
}

impl<T> RunType<T> {
    #[must_use]
    pub(crate) fn of<R>(&self, new_value: R) -> RunType<R> {
        match self {
            RunType::DryRun(_) => RunType::DryRun(new_value),
            RunType::Real(_) => RunType::Real(new_value),
        }
    }

    pub(crate) fn take(self) -> (RunType<()>, T) {
        match self {
            RunType::DryRun(inner) => (RunType::DryRun(()), inner),
            RunType::Real(inner) => (RunType::Real(()), inner),
        }
    }
}
