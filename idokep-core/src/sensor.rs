//! Sensors exposed to consumers, each reading one value out of the
//! coordinator's latest [`Snapshot`].

use std::fmt;

use crate::{
    coordinator::Snapshot,
    model::{ConditionValue, ResultBundle, TemperatureUnit},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SensorValue {
    Temperature(f64),
    Condition(ConditionValue),
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Temperature(value) => write!(f, "{value}"),
            SensorValue::Condition(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    read: fn(&ResultBundle) -> SensorValue,
}

impl SensorDescription {
    /// `None` while the sensor is unavailable: no bundle yet, or the latest
    /// cycle failed.
    pub fn native_value(&self, snapshot: &Snapshot) -> Option<SensorValue> {
        if !snapshot.available() {
            return None;
        }
        snapshot.data.as_deref().map(self.read)
    }
}

pub const TEMPERATURE: SensorDescription = SensorDescription {
    key: "temperature",
    name: "Temperature",
    unit: Some(TemperatureUnit::Celsius.symbol()),
    read: current_temperature,
};

pub const CONDITION: SensorDescription = SensorDescription {
    key: "condition",
    name: "Condition",
    unit: None,
    read: current_condition,
};

pub const SENSORS: &[SensorDescription] = &[TEMPERATURE, CONDITION];

fn current_temperature(bundle: &ResultBundle) -> SensorValue {
    SensorValue::Temperature(bundle.current.temperature)
}

fn current_condition(bundle: &ResultBundle) -> SensorValue {
    SensorValue::Condition(bundle.current.condition.clone())
}
