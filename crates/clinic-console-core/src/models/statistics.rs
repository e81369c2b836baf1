//! Clinic-wide counters shown on the statistics screen.

use serde::{Deserialize, Serialize};

use super::wire;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    #[serde(deserialize_with = "count")]
    pub total_patients: u32,
    #[serde(deserialize_with = "count")]
    pub total_rendezvous: u32,
    /// Leave requests
    #[serde(deserialize_with = "count")]
    pub total_conges: u32,
    #[serde(deserialize_with = "count")]
    pub total_equipments: u32,
    #[serde(deserialize_with = "count")]
    pub total_medecins: u32,
    #[serde(deserialize_with = "count")]
    pub total_infirmiers: u32,
    #[serde(deserialize_with = "count")]
    pub total_techniciens: u32,
    #[serde(deserialize_with = "count")]
    pub total_secretaires: u32,
}

fn count<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(wire::opt_count(deserializer)?.unwrap_or_default())
}

impl Statistics {
    /// (label, value) pairs in display order.
    pub fn rows(&self) -> Vec<(&'static str, u32)> {
        vec![
            ("Patients", self.total_patients),
            ("Appointments", self.total_rendezvous),
            ("Leave requests", self.total_conges),
            ("Equipment", self.total_equipments),
            ("Physicians", self.total_medecins),
            ("Nurses", self.total_infirmiers),
            ("Technicians", self.total_techniciens),
            ("Secretaries", self.total_secretaires),
        ]
    }

    /// Staff headcount across the four roles.
    pub fn total_staff(&self) -> u32 {
        self.total_medecins
            + self.total_infirmiers
            + self.total_techniciens
            + self.total_secretaires
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counters_default_to_zero() {
        let stats: Statistics =
            serde_json::from_str(r#"{"totalPatients": 12, "totalMedecins": "3", "totalConges": null}"#)
                .unwrap();

        assert_eq!(stats.total_patients, 12);
        assert_eq!(stats.total_medecins, 3);
        assert_eq!(stats.total_conges, 0);
        assert_eq!(stats.total_rendezvous, 0);
    }

    #[test]
    fn test_rows_and_staff_total() {
        let stats = Statistics {
            total_medecins: 2,
            total_infirmiers: 3,
            total_secretaires: 1,
            ..Default::default()
        };
        assert_eq!(stats.total_staff(), 6);
        assert_eq!(stats.rows().len(), 8);
        assert_eq!(stats.rows()[4], ("Physicians", 2));
    }
}
