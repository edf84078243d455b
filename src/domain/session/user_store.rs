//! Wallet session holder

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::info;

use crate::domain::chain::{ChainInterface, TxSubmitter};
use crate::shared::types::{ChainId, Session};

/// Web3 handles plus the connected session. Pool stores only read from it.
pub struct UserStore {
    chain: Arc<dyn ChainInterface>,
    submitter: Arc<dyn TxSubmitter>,
    session: watch::Sender<Session>,
}

impl UserStore {
    pub fn new(chain: Arc<dyn ChainInterface>, submitter: Arc<dyn TxSubmitter>) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self {
            chain,
            submitter,
            session,
        }
    }

    /// Build from one backend that provides both queries and submission
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: ChainInterface + TxSubmitter + 'static,
    {
        Self::new(backend.clone(), backend)
    }

    pub fn connect(&self, user: Address, chain: ChainId) {
        info!("🔌 wallet {} connected on chain {}", user, chain);
        self.session.send_replace(Session {
            user,
            chain,
            logged_in: true,
        });
    }

    pub fn disconnect(&self) {
        self.session.send_replace(Session::default());
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn logged_in(&self) -> bool {
        self.session.borrow().logged_in
    }

    /// Observe (re)connects and chain switches
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn chain(&self) -> Arc<dyn ChainInterface> {
        Arc::clone(&self.chain)
    }

    pub fn submitter(&self) -> Arc<dyn TxSubmitter> {
        Arc::clone(&self.submitter)
    }
}
