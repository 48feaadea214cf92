//! Lead units and their shift arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendar::ShiftFrequency;
use crate::error::{Result, VerifyError};

/// Unit a forecast's leads are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadUnit {
    Years,
    Seasons,
    Months,
    Weeks,
    Pentads,
    Days,
}

impl LeadUnit {
    pub const ALL: [LeadUnit; 6] = [
        LeadUnit::Years,
        LeadUnit::Seasons,
        LeadUnit::Months,
        LeadUnit::Weeks,
        LeadUnit::Pentads,
        LeadUnit::Days,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Years => "years",
            Self::Seasons => "seasons",
            Self::Months => "months",
            Self::Weeks => "weeks",
            Self::Pentads => "pentads",
            Self::Days => "days",
        }
    }

    pub fn parse(unit: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|u| u.name() == unit)
            .ok_or_else(|| VerifyError::UnknownLeadUnit {
                unit: unit.to_string(),
                valid: Self::ALL.iter().map(|u| u.name().to_string()).collect(),
            })
    }

    /// Shift frequency shared by every lead in this unit.
    pub fn frequency(&self) -> ShiftFrequency {
        match self {
            Self::Years => ShiftFrequency::YearStart,
            Self::Seasons | Self::Months => ShiftFrequency::MonthStart,
            Self::Weeks | Self::Pentads | Self::Days => ShiftFrequency::Day,
        }
    }

    /// Number of `frequency()` steps one lead of this unit spans.
    pub fn amount(&self, lead: u32) -> i64 {
        let lead = lead as i64;
        match self {
            Self::Years | Self::Months | Self::Days => lead,
            Self::Seasons => lead * 3,
            Self::Weeks => lead * 7,
            Self::Pentads => lead * 5,
        }
    }
}

impl fmt::Display for LeadUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve one lead into `(shift_amount, shift_frequency)`.
pub fn resolve(lead: u32, unit: &str) -> Result<(i64, ShiftFrequency)> {
    let unit = LeadUnit::parse(unit)?;
    Ok((unit.amount(lead), unit.frequency()))
}

/// Shift arguments for every lead of one forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadShifts {
    pub frequency: ShiftFrequency,
    /// One amount per lead, in declared lead order.
    pub amounts: Vec<i64>,
}

/// Resolve all leads at once. The frequency is common by construction.
pub fn resolve_all(leads: &[u32], unit: LeadUnit) -> LeadShifts {
    LeadShifts {
        frequency: unit.frequency(),
        amounts: leads.iter().map(|&l| unit.amount(l)).collect(),
    }
}
