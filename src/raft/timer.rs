use std::sync::Arc;
use std::time::Duration;

use ::log::{debug, info, trace, warn};
use rand::Rng;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

use super::RaftNode;

/// Uniformly random countdown in `[min_ms, max_ms)`.
pub fn random_election_timeout(min_ms: u64, max_ms: u64) -> Duration {
    if min_ms >= max_ms {
        return Duration::from_millis(min_ms);
    }
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(min_ms..max_ms))
}

/// Cloneable handle used to push the election countdown back.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<()>,
}

impl TimerHandle {
    /// Restarts the countdown with a fresh random duration. Never blocks;
    /// a reset that is already pending absorbs this one.
    pub fn reset(&self) {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => {
                debug!("Election timer is not running, reset ignored");
            }
        }
    }
}

/// Creates the reset channel shared by an [`ElectionTimer`] and its handles.
pub fn election_timer_channel() -> (TimerHandle, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(1);
    (TimerHandle { tx }, rx)
}

/// Countdown that starts an election when no heartbeat resets it in time.
pub struct ElectionTimer {
    node: Arc<Mutex<RaftNode>>,
    resets: mpsc::Receiver<()>,
    trigger: mpsc::Sender<()>,
    min_ms: u64,
    max_ms: u64,
}

impl ElectionTimer {
    pub fn new(
        node: Arc<Mutex<RaftNode>>,
        resets: mpsc::Receiver<()>,
        trigger: mpsc::Sender<()>,
        min_ms: u64,
        max_ms: u64,
    ) -> Self {
        Self {
            node,
            resets,
            trigger,
            min_ms,
            max_ms,
        }
    }

    pub async fn run(mut self) {
        let mut resets_open = true;

        loop {
            let countdown = random_election_timeout(self.min_ms, self.max_ms);

            let elapsed = if resets_open {
                match timeout(countdown, self.resets.recv()).await {
                    Ok(Some(())) => false,
                    Ok(None) => {
                        resets_open = false;
                        sleep(countdown).await;
                        true
                    }
                    Err(_) => true,
                }
            } else {
                sleep(countdown).await;
                true
            };

            if !elapsed {
                trace!("Election countdown reset");
                continue;
            }

            info!("Election timer timed out after {}ms", countdown.as_millis());
            let start = self.node.lock().await.on_election_timeout();
            if start && self.trigger.send(()).await.is_err() {
                warn!("Election coordinator is not running");
            }
        }
    }
}

/// Fixed-interval ticker that asks for a heartbeat broadcast while Leader.
pub struct HeartbeatTimer {
    node: Arc<Mutex<RaftNode>>,
    trigger: mpsc::Sender<()>,
    interval: Duration,
}

impl HeartbeatTimer {
    pub fn new(node: Arc<Mutex<RaftNode>>, trigger: mpsc::Sender<()>, interval: Duration) -> Self {
        Self {
            node,
            trigger,
            interval,
        }
    }

    pub async fn run(self) {
        loop {
            let leader = self.node.lock().await.is_leader();
            if leader {
                match self.trigger.try_send(()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(())) => trace!("Heartbeat broadcast still pending"),
                    Err(TrySendError::Closed(())) => warn!("Heartbeat broadcaster is not running"),
                }
            }
            sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raft::NodeRole;

    fn shared_node() -> Arc<Mutex<RaftNode>> {
        Arc::new(Mutex::new(RaftNode::new("n1", 3)))
    }

    #[test]
    fn random_timeout_stays_in_range() {
        for _ in 0..1000 {
            let t = random_election_timeout(1500, 3000);
            assert!(t >= Duration::from_millis(1500));
            assert!(t < Duration::from_millis(3000));
        }
        assert_eq!(
            random_election_timeout(200, 200),
            Duration::from_millis(200)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_countdown_triggers_election() {
        let node = shared_node();
        let (_handle, resets) = election_timer_channel();
        let (trigger_tx, mut trigger_rx) = mpsc::channel(1);

        let timer = ElectionTimer::new(Arc::clone(&node), resets, trigger_tx, 100, 200);
        let task = tokio::spawn(timer.run());

        let fired = timeout(Duration::from_millis(250), trigger_rx.recv()).await;
        assert!(matches!(fired, Ok(Some(()))));
        assert_eq!(node.lock().await.role(), NodeRole::Candidate);
        assert!(node.lock().await.state().electing);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn frequent_resets_suppress_election() {
        let node = shared_node();
        let (handle, resets) = election_timer_channel();
        let (trigger_tx, mut trigger_rx) = mpsc::channel(1);

        let timer = ElectionTimer::new(Arc::clone(&node), resets, trigger_tx, 100, 200);
        let task = tokio::spawn(timer.run());

        for _ in 0..40 {
            sleep(Duration::from_millis(50)).await;
            handle.reset();
        }
        assert!(trigger_rx.try_recv().is_err());
        assert_eq!(node.lock().await.role(), NodeRole::Follower);

        // Once heartbeats stop, the countdown elapses
        let fired = timeout(Duration::from_millis(300), trigger_rx.recv()).await;
        assert!(matches!(fired, Ok(Some(()))));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn leader_ignores_election_countdown() {
        let node = shared_node();
        node.lock().await.change_role(NodeRole::Leader);
        let (_handle, resets) = election_timer_channel();
        let (trigger_tx, mut trigger_rx) = mpsc::channel(1);

        let timer = ElectionTimer::new(Arc::clone(&node), resets, trigger_tx, 100, 200);
        let task = tokio::spawn(timer.run());

        sleep(Duration::from_millis(1000)).await;
        assert!(trigger_rx.try_recv().is_err());
        assert!(node.lock().await.is_leader());

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_timer_fires_only_for_leader() {
        let node = shared_node();
        let (trigger_tx, mut trigger_rx) = mpsc::channel(1);

        let timer = HeartbeatTimer::new(Arc::clone(&node), trigger_tx, Duration::from_millis(50));
        let task = tokio::spawn(timer.run());

        sleep(Duration::from_millis(200)).await;
        assert!(trigger_rx.try_recv().is_err());

        node.lock().await.change_role(NodeRole::Leader);
        let fired = timeout(Duration::from_millis(100), trigger_rx.recv()).await;
        assert!(matches!(fired, Ok(Some(()))));

        task.abort();
    }
}
