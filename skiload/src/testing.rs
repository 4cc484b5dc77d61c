use crate::issuer::{LiftRide, Target, TargetError};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

type Reply = Box<dyn Fn(&LiftRide) -> Result<u16, TargetError> + Send + Sync>;
type Hold = Box<dyn Fn(&LiftRide) -> bool + Send + Sync>;
type Delay = Box<dyn Fn(&LiftRide) -> Duration + Send + Sync>;

/// In-memory target recording every ride it receives.
///
/// Rides matching the hold predicate park until [`FakeTarget::open`] is called, which lets
/// tests pin workers in place while they inspect the orchestration.
pub(crate) struct FakeTarget {
    reply: Reply,
    hold: Option<Hold>,
    delay: Option<Delay>,
    gate_tx: watch::Sender<bool>,
    gate_rx: watch::Receiver<bool>,
    rides: Mutex<Vec<LiftRide>>,
}

impl FakeTarget {
    pub fn replying<F>(reply: F) -> Self
    where
        F: Fn(&LiftRide) -> Result<u16, TargetError> + Send + Sync + 'static,
    {
        let (gate_tx, gate_rx) = watch::channel(false);
        Self {
            reply: Box::new(reply),
            hold: None,
            delay: None,
            gate_tx,
            gate_rx,
            rides: Mutex::new(vec![]),
        }
    }

    pub fn created() -> Self {
        Self::replying(|_| Ok(201))
    }

    pub fn holding<F>(mut self, hold: F) -> Self
    where
        F: Fn(&LiftRide) -> bool + Send + Sync + 'static,
    {
        self.hold = Some(Box::new(hold));
        self
    }

    /// Sleep for `delay(ride)` before replying.
    pub fn delaying<F>(mut self, delay: F) -> Self
    where
        F: Fn(&LiftRide) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn open(&self) {
        self.gate_tx.send_replace(true);
    }

    pub fn rides(&self) -> Vec<LiftRide> {
        self.rides.lock().unwrap().clone()
    }
}

impl Target for FakeTarget {
    async fn post(&self, ride: &LiftRide) -> Result<u16, TargetError> {
        self.rides.lock().unwrap().push(*ride);

        if self.hold.as_ref().is_some_and(|hold| hold(ride)) {
            let mut gate = self.gate_rx.clone();
            let _ = gate.wait_for(|open| *open).await;
        }

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(ride)).await;
        }

        (self.reply)(ride)
    }
}
