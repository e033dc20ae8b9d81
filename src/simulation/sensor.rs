//! Demand sensor over the minor-road approaches
//!
//! Watches the sensor zones in front of each minor-road stop line and turns
//! latch transitions into events for the signal strategy.

use super::car::SimCar;
use super::geometry::{Layout, SensorZone};
use super::signal::{Phase, SensorEvent, SignalState};
use super::types::{Branch, RoadClass};

#[derive(Debug, Clone)]
pub struct DemandSensor {
    zones: [SensorZone; 2],
    /// Departures counted during the current green, per branch
    departures: [u32; 2],
}

impl DemandSensor {
    pub fn new(layout: &Layout) -> Self {
        Self {
            zones: layout.sensor_zones,
            departures: [0; 2],
        }
    }

    pub fn departures(&self, branch: Branch) -> u32 {
        self.departures[branch.index()]
    }

    pub fn total_departures(&self) -> u32 {
        self.departures.iter().sum()
    }

    /// Start a fresh count when a branch green begins
    pub fn reset_count(&mut self, branch: Branch) {
        self.departures[branch.index()] = 0;
    }

    pub fn reset_counts(&mut self) {
        self.departures = [0; 2];
    }

    /// Unlatch every vehicle so waiting cars trigger again
    pub fn reset_latches<'a>(&self, cars: impl IntoIterator<Item = &'a mut SimCar>) {
        for car in cars {
            car.sensor_latch = [false; 2];
        }
    }

    /// Scan the secondary vehicles and collect the events their latch
    /// transitions produce
    pub fn detect<'a>(
        &mut self,
        cars: impl IntoIterator<Item = &'a mut SimCar>,
        signal: &SignalState,
    ) -> Vec<SensorEvent> {
        let mut events = Vec::new();

        for car in cars.into_iter().filter(|c| c.class == RoadClass::Secondary) {
            let body = Layout::footprint_of(car.class, &car.position);

            for (slot, zone) in self.zones.iter().enumerate() {
                let over = body.overlaps(&zone.area);
                let latched = car.sensor_latch[slot];

                if over && !latched {
                    car.sensor_latch[slot] = true;
                    if signal.phase == Phase::PrimaryGreen {
                        events.push(SensorEvent::DemandDetected {
                            branch: zone.branch,
                            elapsed_green: signal.phase_elapsed,
                        });
                    }
                } else if !over && latched {
                    car.sensor_latch[slot] = false;
                    if signal.branch_green(zone.branch) {
                        let count = &mut self.departures[zone.branch.index()];
                        *count += 1;
                        events.push(SensorEvent::Departed {
                            branch: zone.branch,
                            count: *count,
                        });
                    }
                }
            }
        }

        events
    }
}
