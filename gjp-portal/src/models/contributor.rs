//! Contributors step
//!
//! [`ContributorList`] owns the single-primary-contact invariant: every
//! mutation that sets `is_primary_contact` on one entry clears it on all
//! others.

use super::account::UserProfile;
use super::null_as_default;
use gjp_common::{Error, Result};
use serde::{Deserialize, Serialize};

fn yes() -> bool {
    true
}

/// One contributor record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub given_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub family_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(rename = "homepageURL", default, deserialize_with = "null_as_default")]
    pub homepage_url: String,
    #[serde(rename = "orcidID", default, deserialize_with = "null_as_default")]
    pub orcid_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio_statement: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub affiliation: String,
    #[serde(default = "yes")]
    pub is_author: bool,
    #[serde(default)]
    pub is_translator: bool,
    #[serde(default = "yes")]
    pub include_in_publications: bool,
    #[serde(default)]
    pub is_primary_contact: bool,
}

impl Default for Contributor {
    fn default() -> Self {
        Self {
            given_name: String::new(),
            family_name: String::new(),
            preferred_name: String::new(),
            email: String::new(),
            country: String::new(),
            homepage_url: String::new(),
            orcid_id: String::new(),
            bio_statement: String::new(),
            affiliation: String::new(),
            is_author: true,
            is_translator: false,
            include_in_publications: true,
            is_primary_contact: false,
        }
    }
}

impl Contributor {
    pub fn new(given_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Build a contributor from the logged-in user's profile
    ///
    /// When the profile only carries a single display name it is split on the
    /// first space into given and family name.
    pub fn from_profile(profile: &UserProfile) -> Self {
        let (given, family) = match (&profile.first_name, &profile.last_name) {
            (Some(first), last) if !first.is_empty() => {
                (first.clone(), last.clone().unwrap_or_default())
            }
            _ => split_name(&profile.name),
        };

        let full = format!("{} {}", given, family).trim().to_string();

        Self {
            preferred_name: profile.preferred_name.clone().unwrap_or(full),
            given_name: given,
            family_name: family,
            email: profile.email.clone(),
            country: profile.country.clone().unwrap_or_default(),
            homepage_url: profile.website.clone().unwrap_or_default(),
            orcid_id: profile.orcid_id.clone().unwrap_or_default(),
            bio_statement: profile.bio.clone().unwrap_or_default(),
            affiliation: profile.affiliation.clone().unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
            .trim()
            .to_string()
    }

    /// `Author|Contributor[, Translator][, Primary Contact]`
    pub fn role_label(&self) -> String {
        let mut role = String::from(if self.is_author { "Author" } else { "Contributor" });
        if self.is_translator {
            role.push_str(", Translator");
        }
        if self.is_primary_contact {
            role.push_str(", Primary Contact");
        }
        role
    }
}

fn split_name(name: &str) -> (String, String) {
    let name = name.trim();
    match name.split_once(' ') {
        Some((given, family)) => (given.to_string(), family.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}

/// Ordered contributors of one draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributorList(Vec<Contributor>);

impl ContributorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contributor> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Contributor] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Contributor> {
        self.0.get(index)
    }

    /// Append a contributor and return its index
    ///
    /// The first contributor of an empty list becomes primary contact.
    pub fn add(&mut self, mut contributor: Contributor) -> usize {
        if self.0.is_empty() {
            contributor.is_primary_contact = true;
        }
        let index = self.0.len();
        let primary = contributor.is_primary_contact;
        self.0.push(contributor);
        if primary {
            self.clear_primary_except(index);
        }
        index
    }

    /// Replace the contributor at `index`
    pub fn update(&mut self, index: usize, contributor: Contributor) -> Result<()> {
        let slot = self
            .0
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("contributor #{}", index)))?;
        let primary = contributor.is_primary_contact;
        *slot = contributor;
        if primary {
            self.clear_primary_except(index);
        }
        Ok(())
    }

    /// Make `index` the only primary contact; idempotent
    pub fn set_primary_contact(&mut self, index: usize) -> Result<()> {
        if index >= self.0.len() {
            return Err(Error::NotFound(format!("contributor #{}", index)));
        }
        for (i, c) in self.0.iter_mut().enumerate() {
            c.is_primary_contact = i == index;
        }
        Ok(())
    }

    /// Remove and return the contributor at `index`
    ///
    /// Removing the primary contact leaves the list without one.
    pub fn remove(&mut self, index: usize) -> Result<Contributor> {
        if index >= self.0.len() {
            return Err(Error::NotFound(format!("contributor #{}", index)));
        }
        Ok(self.0.remove(index))
    }

    pub fn primary_contact(&self) -> Option<&Contributor> {
        self.0.iter().find(|c| c.is_primary_contact)
    }

    pub fn primary_contact_count(&self) -> usize {
        self.0.iter().filter(|c| c.is_primary_contact).count()
    }

    fn clear_primary_except(&mut self, keep: usize) {
        for (i, c) in self.0.iter_mut().enumerate() {
            if i != keep {
                c.is_primary_contact = false;
            }
        }
    }
}

impl From<Vec<Contributor>> for ContributorList {
    fn from(contributors: Vec<Contributor>) -> Self {
        Self(contributors)
    }
}

impl From<ContributorList> for Vec<Contributor> {
    fn from(list: ContributorList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a ContributorList {
    type Item = &'a Contributor;
    type IntoIter = std::slice::Iter<'a, Contributor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> ContributorList {
        let mut list = ContributorList::new();
        list.add(Contributor::new("Ana", "ana@uni.edu"));
        list.add(Contributor::new("Ben", "ben@uni.edu"));
        list.add(Contributor::new("Chen", "chen@uni.edu"));
        list
    }

    #[test]
    fn test_first_added_is_primary() {
        let list = three();
        assert_eq!(list.primary_contact().unwrap().given_name, "Ana");
        assert_eq!(list.primary_contact_count(), 1);
    }

    #[test]
    fn test_set_primary_clears_others_and_is_idempotent() {
        let mut list = three();

        list.set_primary_contact(2).unwrap();
        assert_eq!(list.primary_contact().unwrap().given_name, "Chen");
        assert_eq!(list.primary_contact_count(), 1);

        let before = list.clone();
        list.set_primary_contact(2).unwrap();
        assert_eq!(list, before);
    }

    #[test]
    fn test_add_with_primary_flag_steals_it() {
        let mut list = three();
        let mut dana = Contributor::new("Dana", "dana@uni.edu");
        dana.is_primary_contact = true;

        let index = list.add(dana);

        assert_eq!(index, 3);
        assert_eq!(list.primary_contact().unwrap().given_name, "Dana");
        assert_eq!(list.primary_contact_count(), 1);
    }

    #[test]
    fn test_update_with_primary_clears_others() {
        let mut list = three();
        let mut ben = list.get(1).unwrap().clone();
        ben.is_primary_contact = true;
        ben.affiliation = "MITS".to_string();

        list.update(1, ben).unwrap();

        assert_eq!(list.primary_contact().unwrap().given_name, "Ben");
        assert_eq!(list.primary_contact_count(), 1);
        assert_eq!(list.get(1).unwrap().affiliation, "MITS");
    }

    #[test]
    fn test_out_of_range_index() {
        let mut list = three();
        assert!(matches!(list.set_primary_contact(9), Err(Error::NotFound(_))));
        assert!(list.remove(3).is_err());
        assert!(list.update(5, Contributor::default()).is_err());
    }

    #[test]
    fn test_remove_primary_leaves_none() {
        let mut list = three();
        let removed = list.remove(0).unwrap();
        assert!(removed.is_primary_contact);
        assert_eq!(list.len(), 2);
        assert!(list.primary_contact().is_none());
    }

    #[test]
    fn test_role_label() {
        let mut c = Contributor::new("Ana", "ana@uni.edu");
        assert_eq!(c.role_label(), "Author");
        c.is_translator = true;
        c.is_primary_contact = true;
        assert_eq!(c.role_label(), "Author, Translator, Primary Contact");
        c.is_author = false;
        c.is_translator = false;
        c.is_primary_contact = false;
        assert_eq!(c.role_label(), "Contributor");
    }

    #[test]
    fn test_from_profile_splits_display_name() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 12,
            "name": "Prateek Sunil Kumar",
            "email": "prateek@mits.ac.in",
            "affiliation": "MITS",
            "country": "India"
        }))
        .unwrap();

        let c = Contributor::from_profile(&profile);

        assert_eq!(c.given_name, "Prateek");
        assert_eq!(c.family_name, "Sunil Kumar");
        assert_eq!(c.preferred_name, "Prateek Sunil Kumar");
        assert_eq!(c.email, "prateek@mits.ac.in");
        assert_eq!(c.affiliation, "MITS");
        assert!(c.is_author);
        assert!(c.include_in_publications);
        assert!(!c.is_primary_contact);
    }

    #[test]
    fn test_wire_names() {
        let mut c = Contributor::new("A", "a@x.com");
        c.homepage_url = "https://a.example".to_string();
        c.orcid_id = "0000-0002-1825-0097".to_string();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["givenName"], "A");
        assert_eq!(json["homepageURL"], "https://a.example");
        assert_eq!(json["orcidID"], "0000-0002-1825-0097");
        assert_eq!(json["isPrimaryContact"], false);
    }

    #[test]
    fn test_missing_flags_use_defaults() {
        let c: Contributor =
            serde_json::from_str(r#"{"givenName":"A","email":"a@x.com"}"#).unwrap();
        assert!(c.is_author);
        assert!(c.include_in_publications);
        assert!(!c.is_translator);
        assert!(!c.is_primary_contact);
    }
}
