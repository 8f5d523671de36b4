//! Field checks run before anything is submitted to the device
//!
//! Every check is pure and reports the offending field together with a
//! message the operator can act on.

use crate::types::OctetInputs;
use regex::Regex;
use serde_valid::Validate;
use std::{fmt, sync::OnceLock};
use thiserror::Error;

pub const SSID_MIN_LEN: usize = 8;
pub const SSID_MAX_LEN: usize = 16;
pub const PASSWORD_MIN_LEN: usize = 8;

pub const SLAVE_LIST_MESSAGE: &str =
    "Slave list must be IDs from 0 to 255 or ascending ranges of them separated by commas, e.g. 1,3,5-8";

/// Address an octet belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpField {
    Device,
    Gateway,
    Subnet,
    Modbus,
}

impl IpField {
    fn input_prefix(&self) -> &'static str {
        match self {
            Self::Device => "device-ip",
            Self::Gateway => "gateway-ip",
            Self::Subnet => "subnet-ip",
            Self::Modbus => "modbus-ip",
        }
    }
}

/// Form input that failed validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Ssid,
    Password,
    /// `index` is zero based, the input id is one based
    Octet { ip: IpField, index: usize },
    Port,
    SlaveList,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssid => write!(f, "ssid"),
            Self::Password => write!(f, "password"),
            Self::Octet { ip, index } => write!(f, "{}{}", ip.input_prefix(), index + 1),
            Self::Port => write!(f, "port-input"),
            Self::SlaveList => write!(f, "slave-list-input"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Validate)]
struct SsidRule {
    #[validate(min_length = 8)]
    #[validate(max_length = 16)]
    ssid: String,
}

#[derive(Validate)]
struct PasswordRule {
    #[validate(min_length = 8)]
    password: String,
}

#[derive(Validate)]
struct OctetRule {
    #[validate(minimum = 0)]
    #[validate(maximum = 255)]
    octet: i64,
}

#[derive(Validate)]
struct PortRule {
    #[validate(minimum = 0)]
    #[validate(maximum = 65535)]
    port: i64,
}

pub fn validate_ssid(ssid: &str) -> Result<(), ValidationError> {
    SsidRule {
        ssid: ssid.to_string(),
    }
    .validate()
    .map_err(|_| {
        ValidationError::new(
            Field::Ssid,
            format!("SSID must be {SSID_MIN_LEN} to {SSID_MAX_LEN} characters long"),
        )
    })
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    PasswordRule {
        password: password.to_string(),
    }
    .validate()
    .map_err(|_| {
        ValidationError::new(
            Field::Password,
            format!("Password must be at least {PASSWORD_MIN_LEN} characters long"),
        )
    })
}

/// Check a single octet input; non-numeric input fails like an out-of-range one
pub fn validate_octet(ip: IpField, index: usize, input: &str) -> Result<u8, ValidationError> {
    let invalid = || {
        ValidationError::new(
            Field::Octet { ip, index },
            "IP octet must be a number from 0 to 255",
        )
    };

    let octet = input.trim().parse::<i64>().map_err(|_| invalid())?;
    OctetRule { octet }.validate().map_err(|_| invalid())?;
    u8::try_from(octet).map_err(|_| invalid())
}

/// Check the four inputs of an address in order, stopping at the first bad one
pub fn validate_ipv4(ip: IpField, inputs: &OctetInputs) -> Result<[u8; 4], ValidationError> {
    let mut octets = [0u8; 4];
    for (index, input) in inputs.iter().enumerate() {
        octets[index] = validate_octet(ip, index, input)?;
    }
    Ok(octets)
}

pub fn validate_port(input: &str) -> Result<u16, ValidationError> {
    let invalid = || ValidationError::new(Field::Port, "Port must be a number from 0 to 65535");

    let port = input.trim().parse::<i64>().map_err(|_| invalid())?;
    PortRule { port }.validate().map_err(|_| invalid())?;
    u16::try_from(port).map_err(|_| invalid())
}

fn slave_list_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^\s*\d+\s*(-\s*\d+\s*)?(,\s*\d+\s*(-\s*\d+\s*)?)*$")
            .expect("invalid slave list pattern")
    })
}

/// Check that the text is a comma-separated list of IDs and ascending
/// `start-end` ranges and that every number in it is a valid slave ID
///
/// A list that passes always names at least one ID.
pub fn validate_slave_list(text: &str) -> Result<(), ValidationError> {
    let id = |number: &str| number.trim().parse::<u8>().ok();
    let ids_valid = || {
        text.split(',').all(|token| match token.split_once('-') {
            Some((start, end)) => {
                matches!((id(start), id(end)), (Some(start), Some(end)) if start <= end)
            }
            None => id(token).is_some(),
        })
    };

    if slave_list_shape().is_match(text) && ids_valid() {
        Ok(())
    } else {
        Err(ValidationError::new(Field::SlaveList, SLAVE_LIST_MESSAGE))
    }
}
