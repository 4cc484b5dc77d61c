//! Building and sending a single synthetic lift ride.
use rand::Rng;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use skiload_core::{
    Measurement, PopulationRange, RunCounters, TimeWindow, DAY_IDS, RESORT_IDS, SEASON_IDS,
    STATUS_BAD_REQUEST, STATUS_CREATED,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use time::OffsetDateTime;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[cfg(feature = "metrics")]
const LATENCY_METRIC: &str = "skiload_request_latency";
#[cfg(feature = "metrics")]
const SUCCESS_METRIC: &str = "skiload_request_success";
#[cfg(feature = "metrics")]
const FAILURE_METRIC: &str = "skiload_request_failure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RideBody {
    pub time: u32,
    #[serde(rename = "liftID")]
    pub lift_id: u32,
}

/// One lift ride to post: where it goes and what it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiftRide {
    pub resort_id: u32,
    pub season_id: u32,
    pub day_id: u32,
    pub skier_id: u32,
    pub body: RideBody,
}

impl LiftRide {
    /// Draw every dimension independently and uniformly. `skiers` must not be empty.
    pub fn random<R: Rng>(
        rng: &mut R,
        skiers: PopulationRange,
        window: TimeWindow,
        lifts: u32,
    ) -> Self {
        Self {
            resort_id: rng.gen_range(RESORT_IDS),
            season_id: rng.gen_range(SEASON_IDS),
            day_id: rng.gen_range(DAY_IDS),
            skier_id: rng.gen_range(skiers.ids()),
            body: RideBody {
                time: rng.gen_range(window.start..=window.end),
                lift_id: rng.gen_range(0..lifts),
            },
        }
    }

    pub fn path(&self) -> String {
        format!(
            "/skiers/{}/seasons/{}/days/{}/skiers/{}",
            self.resort_id, self.season_id, self.day_id, self.skier_id
        )
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("No route to host")]
    Unreachable,

    #[error("Request failed: {0}")]
    Io(String),
}

/// The service under load.
#[trait_variant::make(Target: Send)]
pub trait LocalTarget {
    /// Post the ride and return the response status.
    async fn post(&self, ride: &LiftRide) -> Result<u16, TargetError>;
}

/// [`Target`] speaking HTTP to a real endpoint.
pub struct HttpTarget {
    client: Client,
    base_url: String,
}

impl HttpTarget {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.into(),
        })
    }
}

impl Target for HttpTarget {
    async fn post(&self, ride: &LiftRide) -> Result<u16, TargetError> {
        let url = format!("{}{}", self.base_url, ride.path());
        let body = serde_json::to_vec(&ride.body).map_err(|e| TargetError::Io(e.to_string()))?;

        let res = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(body)
            .send()
            .await;

        match res {
            Ok(res) => {
                let status = res.status().as_u16();
                // Read the body so the connection goes back to the pool.
                if let Err(err) = res.bytes().await {
                    trace!("Unable to read response body: {err}");
                }
                Ok(status)
            }
            Err(err) if err.is_connect() => Err(TargetError::Unreachable),
            Err(err) => Err(TargetError::Io(err.to_string())),
        }
    }
}

/// Synthesizes rides, sends them and accounts for the outcome.
///
/// Every call to [`RequestIssuer::issue`] bumps exactly one of the shared counters and
/// yields exactly one [`Measurement`], whatever happens on the wire.
pub struct RequestIssuer<T> {
    target: T,
    counters: Arc<RunCounters>,
    lifts: u32,
}

impl<T> RequestIssuer<T>
where
    T: Target + Sync,
{
    pub fn new(target: T, counters: Arc<RunCounters>, lifts: u32) -> Self {
        Self {
            target,
            counters,
            lifts: lifts.max(1),
        }
    }

    pub fn counters(&self) -> &Arc<RunCounters> {
        &self.counters
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub async fn issue<R: Rng>(
        &self,
        rng: &mut R,
        skiers: PopulationRange,
        window: TimeWindow,
    ) -> Measurement {
        let ride = LiftRide::random(rng, skiers, window, self.lifts);
        self.send(&ride).await
    }

    pub async fn send(&self, ride: &LiftRide) -> Measurement {
        trace!("Posting {} with {:?}", ride.path(), ride.body);

        let issued_at_ms = epoch_millis();
        let start = Instant::now();
        let res = self.target.post(ride).await;
        let latency = start.elapsed();

        let status = match res {
            Ok(STATUS_CREATED) => {
                self.counters.record_success();
                Some(STATUS_CREATED)
            }
            Ok(status) => {
                self.counters.record_failure();
                match status {
                    404 => info!("Resource not found."),
                    500 => error!("Internal server error."),
                    _ => warn!("Unexpected response status {status}."),
                }
                Some(status)
            }
            Err(TargetError::Unreachable) => {
                self.counters.record_failure();
                error!("No route to host.");
                Some(STATUS_BAD_REQUEST)
            }
            Err(TargetError::Io(err)) => {
                self.counters.record_failure();
                error!("IO failure posting lift ride: {err}");
                None
            }
        };

        #[cfg(feature = "metrics")]
        {
            metrics::histogram!(LATENCY_METRIC).record(latency.as_secs_f64());
            if status == Some(STATUS_CREATED) {
                metrics::counter!(SUCCESS_METRIC).increment(1);
            } else {
                metrics::counter!(FAILURE_METRIC).increment(1);
            }
        }

        Measurement::new(issued_at_ms, latency, status)
    }
}

fn epoch_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTarget;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn rides_stay_within_bounds() {
        let mut rng = SmallRng::seed_from_u64(7);
        let skiers = PopulationRange { start: 5, end: 9 };
        let window = TimeWindow::new(91, 360);

        for _ in 0..2_000 {
            let ride = LiftRide::random(&mut rng, skiers, window, 40);
            assert!(RESORT_IDS.contains(&ride.resort_id));
            assert!(SEASON_IDS.contains(&ride.season_id));
            assert!(DAY_IDS.contains(&ride.day_id));
            assert!(skiers.ids().contains(&ride.skier_id));
            assert!(window.contains(ride.body.time));
            assert!(ride.body.lift_id < 40);
        }
    }

    #[test]
    fn single_skier_range() {
        let mut rng = SmallRng::seed_from_u64(1);
        let skiers = PopulationRange { start: 3, end: 3 };
        let ride = LiftRide::random(&mut rng, skiers, TimeWindow::new(1, 1), 1);
        assert_eq!(ride.skier_id, 3);
        assert_eq!(ride.body.time, 1);
        assert_eq!(ride.body.lift_id, 0);
    }

    #[test]
    fn request_shape() {
        let ride = LiftRide {
            resort_id: 4,
            season_id: 2019,
            day_id: 17,
            skier_id: 1234,
            body: RideBody {
                time: 217,
                lift_id: 21,
            },
        };
        assert_eq!(ride.path(), "/skiers/4/seasons/2019/days/17/skiers/1234");
        assert_eq!(
            serde_json::to_string(&ride.body).unwrap(),
            r#"{"time":217,"liftID":21}"#
        );
    }

    fn issuer(target: FakeTarget) -> RequestIssuer<FakeTarget> {
        RequestIssuer::new(target, Arc::new(RunCounters::new()), 40)
    }

    #[tokio::test]
    async fn created_is_a_success() {
        let issuer = issuer(FakeTarget::replying(|_| Ok(201)));
        let mut rng = SmallRng::seed_from_u64(3);

        let m = issuer
            .issue(&mut rng, PopulationRange { start: 1, end: 10 }, TimeWindow::new(1, 90))
            .await;

        assert_eq!(m.status, Some(201));
        assert_eq!(m.kind, "POST");
        assert!(m.issued_at_ms > 0);
        assert_eq!(issuer.counters().success(), 1);
        assert_eq!(issuer.counters().failure(), 0);
        assert_eq!(issuer.target().rides().len(), 1);
    }

    #[tokio::test]
    async fn other_statuses_are_failures() {
        let issuer = issuer(FakeTarget::replying(|ride| {
            if ride.skier_id % 2 == 0 {
                Ok(404)
            } else {
                Ok(500)
            }
        }));
        let mut rng = SmallRng::seed_from_u64(3);

        for _ in 0..10 {
            let m = issuer
                .issue(&mut rng, PopulationRange { start: 1, end: 10 }, TimeWindow::new(1, 90))
                .await;
            assert!(matches!(m.status, Some(404) | Some(500)));
        }
        assert_eq!(issuer.counters().success(), 0);
        assert_eq!(issuer.counters().failure(), 10);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn unreachable_records_bad_request() {
        let issuer = issuer(FakeTarget::replying(|_| Err(TargetError::Unreachable)));
        let mut rng = SmallRng::seed_from_u64(3);

        let m = issuer
            .issue(&mut rng, PopulationRange { start: 1, end: 1 }, TimeWindow::new(1, 90))
            .await;

        assert_eq!(m.status, Some(400));
        assert_eq!(m.status_code(), 400);
        assert_eq!(issuer.counters().failure(), 1);
        assert!(logs_contain("No route to host."));
    }

    fn ride() -> LiftRide {
        LiftRide {
            resort_id: 1,
            season_id: 2017,
            day_id: 3,
            skier_id: 4,
            body: RideBody {
                time: 5,
                lift_id: 6,
            },
        }
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn refused_connection_is_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = HttpTarget::new(format!("http://127.0.0.1:{port}")).unwrap();

        assert!(matches!(
            Target::post(&target, &ride()).await,
            Err(TargetError::Unreachable)
        ));
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn dropped_connection_is_an_io_failure() {
        // Accepts every connection and hangs up without answering.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });
        let issuer = RequestIssuer::new(
            HttpTarget::new(format!("http://{addr}")).unwrap(),
            Arc::new(RunCounters::new()),
            40,
        );

        let m = issuer.send(&ride()).await;

        assert_eq!(m.status, None);
        assert_eq!(m.status_code(), -1);
        assert_eq!(issuer.counters().success(), 0);
        assert_eq!(issuer.counters().failure(), 1);
    }

    #[tokio::test]
    async fn io_failure_still_yields_a_measurement() {
        let issuer = issuer(FakeTarget::replying(|_| {
            Err(TargetError::Io("connection reset".to_string()))
        }));
        let mut rng = SmallRng::seed_from_u64(3);

        let m = issuer
            .issue(&mut rng, PopulationRange { start: 1, end: 1 }, TimeWindow::new(1, 90))
            .await;

        assert_eq!(m.status, None);
        assert_eq!(m.status_code(), -1);
        assert_eq!(issuer.counters().success(), 0);
        assert_eq!(issuer.counters().failure(), 1);
    }
}
