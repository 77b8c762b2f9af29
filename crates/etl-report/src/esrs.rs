//! ESRS E5-5 waste figures computed from accepted records.
//!
//! Records are split into non-hazardous and hazardous waste (a waste code
//! containing `*` is hazardous). Recovery and energy rates are percentages.
//! Product groups in `disposal_groups` go to final disposal instead of
//! recovery.

use chrono::NaiveDate;
use etl_model::{CellValue, ColumnSpec, NormalizedRecord};
use serde::{Deserialize, Serialize};

/// Column names (key or display name) the waste figures are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsrsColumns {
    pub weight: String,
    pub material_rate: String,
    pub energy_rate: String,
    pub product_group: String,
    pub waste_code: String,
    pub date: String,
    pub disposal_groups: Vec<String>,
}

impl Default for EsrsColumns {
    fn default() -> Self {
        Self {
            weight: "Paino".to_string(),
            material_rate: "Materiaalihyotyaste".to_string(),
            energy_rate: "Energiahyotyaste".to_string(),
            product_group: "Tuoteryhma".to_string(),
            waste_code: "EWCkoodi".to_string(),
            date: "Pvm".to_string(),
            disposal_groups: vec!["AS".to_string(), "KAA".to_string(), "VI".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct WasteTotals {
    recovery: f64,
    disposal: f64,
    recycling: f64,
    other_recovery: f64,
    landfilling: f64,
    other_disposal: f64,
}

impl WasteTotals {
    fn non_recycled(&self) -> f64 {
        self.other_recovery + self.landfilling + self.other_disposal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalWaste {
    pub recovery: f64,
    pub disposal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryBreakdown {
    pub preparation_for_reuse: f64,
    pub recycling: f64,
    pub other_recovery_operations: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalBreakdown {
    pub incineration: f64,
    pub landfilling: f64,
    pub other_disposal_operations: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonRecycled {
    pub weight: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteCategory {
    pub total_waste_generated: TotalWaste,
    pub recovery: RecoveryBreakdown,
    pub disposal: DisposalBreakdown,
    pub non_recycled: NonRecycled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteByHazardousness {
    pub non_hazardous: WasteCategory,
    pub hazardous: WasteCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsrsReport {
    pub reporting_period: String,
    pub unit: String,
    pub waste_by_hazardousness: WasteByHazardousness,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl WasteCategory {
    fn from_totals(totals: &WasteTotals) -> Self {
        let generated = totals.recovery + totals.disposal;
        let non_recycled = totals.non_recycled();
        let percentage = if generated == 0.0 {
            0.0
        } else {
            round_to(non_recycled / generated * 100.0, 2)
        };
        Self {
            total_waste_generated: TotalWaste {
                recovery: round_to(totals.recovery, 3),
                disposal: round_to(totals.disposal, 3),
            },
            recovery: RecoveryBreakdown {
                preparation_for_reuse: 0.0,
                recycling: round_to(totals.recycling, 3),
                other_recovery_operations: round_to(totals.other_recovery, 3),
            },
            disposal: DisposalBreakdown {
                incineration: 0.0,
                landfilling: round_to(totals.landfilling, 3),
                other_disposal_operations: round_to(totals.other_disposal, 3),
            },
            non_recycled: NonRecycled {
                weight: round_to(non_recycled, 3),
                percentage,
            },
        }
    }
}

struct EsrsKeys<'a> {
    weight: &'a str,
    material_rate: &'a str,
    energy_rate: &'a str,
    product_group: &'a str,
    waste_code: &'a str,
    date: &'a str,
}

fn cell_text(value: Option<&CellValue>) -> String {
    match value {
        Some(CellValue::Text(text)) => text.trim().to_string(),
        Some(CellValue::Int(number)) => number.to_string(),
        Some(CellValue::Float(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn column_key<'s>(spec: &'s ColumnSpec, name: &str) -> Option<&'s str> {
    let key = spec.find(name).map(|column| column.key.as_str());
    if key.is_none() {
        tracing::debug!(column = name, "esrs column not in spec, section skipped");
    }
    key
}

fn number(value: Option<&CellValue>) -> f64 {
    value
        .and_then(CellValue::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Compute the E5-5 section, or `None` when the column spec lacks one of the
/// configured columns.
pub fn compute(
    records: &[NormalizedRecord],
    spec: &ColumnSpec,
    columns: &EsrsColumns,
) -> Option<EsrsReport> {
    let keys = EsrsKeys {
        weight: column_key(spec, &columns.weight)?,
        material_rate: column_key(spec, &columns.material_rate)?,
        energy_rate: column_key(spec, &columns.energy_rate)?,
        product_group: column_key(spec, &columns.product_group)?,
        waste_code: column_key(spec, &columns.waste_code)?,
        date: column_key(spec, &columns.date)?,
    };

    let mut non_hazardous = WasteTotals::default();
    let mut hazardous = WasteTotals::default();
    let mut oldest: Option<NaiveDate> = None;
    let mut newest: Option<NaiveDate> = None;

    for record in records {
        let weight = number(record.get(keys.weight));
        let material = number(record.get(keys.material_rate)) / 100.0;
        let energy = number(record.get(keys.energy_rate)) / 100.0;
        let group = cell_text(record.get(keys.product_group)).to_uppercase();
        let is_disposal = columns
            .disposal_groups
            .iter()
            .any(|g| g.eq_ignore_ascii_case(&group));
        let totals = if cell_text(record.get(keys.waste_code)).contains('*') {
            &mut hazardous
        } else {
            &mut non_hazardous
        };

        let rate_sum = material + energy;
        if is_disposal {
            totals.disposal += weight;
            if rate_sum == 0.0 || rate_sum == 1.0 {
                totals.landfilling += weight;
            } else if rate_sum > 0.0 && rate_sum < 1.0 {
                totals.other_disposal += weight;
            }
        } else {
            totals.recovery += rate_sum * weight;
        }
        totals.recycling += material * weight;
        totals.other_recovery += energy * weight;

        if let Some(date) = record.get(keys.date).and_then(CellValue::as_date) {
            oldest = Some(oldest.map_or(date, |d| d.min(date)));
            newest = Some(newest.map_or(date, |d| d.max(date)));
        }
    }

    let reporting_period = match (oldest, newest) {
        (Some(oldest), Some(newest)) => format!(
            "{} - {}",
            oldest.format("%Y-%m-%d"),
            newest.format("%Y-%m-%d")
        ),
        _ => String::new(),
    };

    Some(EsrsReport {
        reporting_period,
        unit: "tonnes".to_string(),
        waste_by_hazardousness: WasteByHazardousness {
            non_hazardous: WasteCategory::from_totals(&non_hazardous),
            hazardous: WasteCategory::from_totals(&hazardous),
        },
    })
}
