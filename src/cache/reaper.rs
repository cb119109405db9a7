use std::time::Duration;

use log::{debug, info};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Orbit, Rocket};

use super::EphemeralStore;

/// Periodically sweeps the ephemeral store so unread images do not pile up.
pub struct StoreReaper {
    store: EphemeralStore,
    interval: Duration,
}

impl StoreReaper {
    pub fn new(store: EphemeralStore, interval_secs: u64) -> Self {
        Self {
            store,
            interval: Duration::from_secs(interval_secs),
        }
    }
}

#[rocket::async_trait]
impl Fairing for StoreReaper {
    fn info(&self) -> Info {
        Info {
            name: "Ephemeral store reaper",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        if self.interval.is_zero() {
            info!("Store reaper disabled");
            return;
        }

        let store = self.store.clone();
        let period = self.interval;
        let mut shutdown = rocket.shutdown();
        info!("Store reaper sweeping every {}s", period.as_secs());

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        if removed > 0 {
                            debug!("Reaper removed {} expired image(s)", removed);
                        }
                    }
                    _ = &mut shutdown => break,
                }
            }
            debug!("Store reaper stopped");
        });
    }
}
