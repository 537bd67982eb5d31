//! Cart reconciler: keeps a locally edited cart in step with the cart store.
//!
//! Local edits apply immediately. A single background worker turns bursts of
//! edits into one `replace` write after a quiet period, so there is at most one
//! write in flight and a newer edit always supersedes a pending one.
//!
//! Session rules:
//!
//! - on login the server cart is loaded once (or, if an anonymous cart holds
//!   items, merged into the server cart once) and replaces local state
//! - edits are only written back after that first load has finished
//! - logout cancels any pending write and empties the local cart
//!
//! Backend failures are logged and dropped; the next edit retries with the
//! then-current cart.

mod backend;

pub use backend::{CartBackend, HttpCartBackend, StoreCartBackend, SyncError};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use cartwright_core::{CartLineInput, ProductId, UserId};

use crate::models::LocalCart;

#[derive(Debug, Default)]
struct Session {
    user: Option<UserId>,
    hydrated: bool,
    /// Bumped on every login/logout; results from an older epoch are dropped.
    epoch: u64,
    cart: LocalCart,
}

#[derive(Debug)]
struct PendingWrite {
    epoch: u64,
    user: UserId,
    lines: Vec<CartLineInput>,
}

enum Command {
    Write(PendingWrite),
    Cancel,
    Flush(oneshot::Sender<()>),
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Client-side cart with debounced write-back.
pub struct CartReconciler<B> {
    backend: Arc<B>,
    session: Arc<Mutex<Session>>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl<B: CartBackend> CartReconciler<B> {
    /// Start a reconciler. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(backend: B, debounce: Duration) -> Self {
        let backend = Arc::new(backend);
        let session = Arc::new(Mutex::new(Session::default()));
        let (commands, receiver) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let worker = SyncWorker {
            backend: Arc::clone(&backend),
            session: Arc::clone(&session),
            commands: receiver,
            debounce,
            shutdown: shutdown.clone(),
        };
        let worker = tokio::spawn(worker.run());

        Self {
            backend,
            session,
            commands,
            shutdown,
            worker,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start (or continue) a session for `user`.
    ///
    /// Hydrates once per login: calling this again for the user that is
    /// already logged in does nothing. An anonymous cart with items is merged
    /// into the user's stored cart and then discarded.
    pub async fn login(&self, user: UserId) {
        let (epoch, guest) = {
            let mut session = lock(&self.session);
            if session.user == Some(user) {
                return;
            }

            let guest = match session.user {
                None if !session.cart.is_empty() => Some(session.cart.lines().to_vec()),
                None => None,
                Some(_) => {
                    session.cart.empty();
                    None
                }
            };
            session.user = Some(user);
            session.hydrated = false;
            session.epoch += 1;
            (session.epoch, guest)
        };
        self.send(Command::Cancel);

        let result = match &guest {
            Some(lines) => self.backend.merge(user, lines).await,
            None => self.backend.fetch(user).await,
        };

        let mut session = lock(&self.session);
        if session.epoch != epoch {
            tracing::debug!(user_id = %user, "Discarding hydration for ended session");
            return;
        }
        match result {
            Ok(lines) => session.cart.set(lines),
            Err(e) => tracing::warn!(user_id = %user, error = %e, "Cart hydration failed"),
        }
        session.hydrated = true;
    }

    /// End the session: drop any pending write and empty the local cart.
    pub fn logout(&self) {
        {
            let mut session = lock(&self.session);
            session.user = None;
            session.hydrated = false;
            session.epoch += 1;
            session.cart.empty();
        }
        self.send(Command::Cancel);
    }

    pub fn add(&self, product: ProductId) {
        self.mutate(|cart| cart.add(product));
    }

    /// Returns `false` if the product was not in the cart.
    pub fn remove(&self, product: ProductId) -> bool {
        self.mutate(|cart| cart.remove(product))
    }

    pub fn empty(&self) {
        self.mutate(LocalCart::empty);
    }

    pub fn set(&self, lines: Vec<CartLineInput>) {
        self.mutate(|cart| cart.set(lines));
    }

    /// Snapshot of the local cart.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLineInput> {
        lock(&self.session).cart.lines().to_vec()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        lock(&self.session).user
    }

    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        lock(&self.session).hydrated
    }

    /// Write any pending edit now and wait for it to finish.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.send(Command::Flush(done));
        let _ = wait.await;
    }

    /// Flush the pending edit and stop the worker.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "Cart sync worker panicked");
        }
    }

    fn mutate<R>(&self, edit: impl FnOnce(&mut LocalCart) -> R) -> R {
        let mut session = lock(&self.session);
        let before = session.cart.clone();
        let out = edit(&mut session.cart);

        if let (Some(user), true) = (session.user, session.hydrated)
            && session.cart != before
        {
            self.send(Command::Write(PendingWrite {
                epoch: session.epoch,
                user,
                lines: session.cart.lines().to_vec(),
            }));
        }
        out
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Cart sync worker has stopped");
        }
    }
}

struct SyncWorker<B> {
    backend: Arc<B>,
    session: Arc<Mutex<Session>>,
    commands: mpsc::UnboundedReceiver<Command>,
    debounce: Duration,
    shutdown: CancellationToken,
}

impl<B: CartBackend> SyncWorker<B> {
    async fn run(mut self) {
        let mut pending: Option<PendingWrite> = None;
        let mut deadline: Option<Instant> = None;

        loop {
            // Queued commands are handled before shutdown so nothing sent
            // ahead of it is lost.
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Write(write)) => {
                        pending = Some(write);
                        deadline = Some(Instant::now() + self.debounce);
                    }
                    Some(Command::Cancel) => {
                        pending = None;
                        deadline = None;
                    }
                    Some(Command::Flush(done)) => {
                        deadline = None;
                        self.write(pending.take()).await;
                        let _ = done.send(());
                    }
                    None => {
                        self.write(pending.take()).await;
                        break;
                    }
                },

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.write(pending.take()).await;
                }

                () = self.shutdown.cancelled() => {
                    self.write(pending.take()).await;
                    break;
                }
            }
        }

        tracing::debug!("Cart sync worker stopped");
    }

    async fn write(&self, pending: Option<PendingWrite>) {
        let Some(write) = pending else {
            return;
        };
        let current = lock(&self.session).epoch;
        if current != write.epoch {
            return;
        }

        match self.backend.replace(write.user, &write.lines).await {
            Ok(stored) => {
                tracing::debug!(user_id = %write.user, lines = stored.len(), "Cart synced");
            }
            Err(e) => {
                tracing::warn!(user_id = %write.user, error = %e, "Cart sync failed");
            }
        }
    }
}
