use std::future::Future;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use refresh_core::error::RefreshError;
use refresh_core::models::account::Account;

/// Result of one account's task.
#[derive(Debug)]
pub enum AccountOutcome<T> {
    Completed { account: Account, value: T },
    Failed { account: Account, error: RefreshError },
}

impl<T> AccountOutcome<T> {
    pub fn account(&self) -> &Account {
        match self {
            AccountOutcome::Completed { account, .. } | AccountOutcome::Failed { account, .. } => {
                account
            }
        }
    }
}

/// Runs one task per account with a concurrency limit. A failing account is
/// reported in its outcome and never cancels the others.
pub struct AccountRunner {
    concurrency: usize,
    show_progress: bool,
}

impl AccountRunner {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb
    }

    /// Run `task` for every account and collect the outcomes.
    ///
    /// Tasks finish in any order; outcomes are returned in the order the
    /// accounts were given so that merged output is stable.
    pub async fn run<T, F, Fut>(&self, accounts: Vec<Account>, task: F) -> Vec<AccountOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(Account) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let task = Arc::new(task);
        let pb = self.progress_bar(accounts.len());
        let mut join_set = JoinSet::new();

        for (index, account) in accounts.into_iter().enumerate() {
            let sem = Arc::clone(&semaphore);
            let task = Arc::clone(&task);

            join_set.spawn(async move {
                // Held until the task returns, error paths included.
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let error = RefreshError::TaskFailed {
                            message: "account scheduler closed".into(),
                        };
                        return (index, AccountOutcome::Failed { account, error });
                    }
                };
                debug!(account = %account.label(), "account task started");

                // The body runs in its own task so a panic is reported
                // against this account instead of being lost.
                let outcome = match tokio::spawn((*task)(account.clone())).await {
                    Ok(Ok(value)) => AccountOutcome::Completed { account, value },
                    Ok(Err(error)) => AccountOutcome::Failed { account, error },
                    Err(e) => AccountOutcome::Failed {
                        account,
                        error: RefreshError::TaskFailed {
                            message: e.to_string(),
                        },
                    },
                };
                (index, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    pb.inc(1);
                    pb.set_message(outcome.account().label());
                    outcomes.push((index, outcome));
                }
                // Only reachable if the wrapper itself panics or is aborted.
                Err(e) => warn!(error = %e, "account task lost"),
            }
        }
        pb.finish_and_clear();

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
