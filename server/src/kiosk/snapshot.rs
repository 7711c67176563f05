use ffw_checkin_api_types::attendance::PresentPersonnel;

/// The last known list of personnel present in one session
///
/// The list is always replaced as a whole by the latest poll response, never patched. Responses
/// arriving out of order may regress the list until the next poll corrects it.
#[derive(Debug, Clone, Default)]
pub struct PresenceSnapshot {
    personnel: Vec<PresentPersonnel>,
}

impl PresenceSnapshot {
    /// Replace the snapshot with `personnel`. Returns true if the list has changed.
    pub fn replace(&mut self, mut personnel: Vec<PresentPersonnel>) -> bool {
        personnel.sort_by(|a, b| {
            a.nachname
                .cmp(&b.nachname)
                .then_with(|| a.vorname.cmp(&b.vorname))
        });
        let changed = personnel != self.personnel;
        self.personnel = personnel;
        changed
    }

    pub fn contains(&self, stammrollennummer: &str) -> bool {
        self.personnel
            .iter()
            .any(|p| p.stammrollennummer == stammrollennummer)
    }

    pub fn personnel(&self) -> &[PresentPersonnel] {
        &self.personnel
    }

    pub fn len(&self) -> usize {
        self.personnel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personnel.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn present(number: &str, nachname: &str) -> PresentPersonnel {
        PresentPersonnel {
            attendance_id: None,
            personnel_id: 1,
            stammrollennummer: number.to_owned(),
            vorname: "Max".to_owned(),
            nachname: nachname.to_owned(),
            dienstgrad: "FM".to_owned(),
            dienstgrad_name: "Feuerwehrmann".to_owned(),
            checked_in_at: NaiveDate::from_ymd_opt(2025, 5, 1)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap()
                .into(),
        }
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut snapshot = PresenceSnapshot::default();
        assert!(snapshot.replace(vec![present("111", "Zander"), present("222", "Adler")]));
        assert_eq!(snapshot.personnel()[0].nachname, "Adler");
        assert!(!snapshot.replace(vec![present("222", "Adler"), present("111", "Zander")]));

        assert!(snapshot.replace(vec![present("333", "Berg")]));
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains("111"));
        assert!(snapshot.contains("333"));

        assert!(snapshot.replace(vec![]));
        assert!(snapshot.is_empty());
    }
}
