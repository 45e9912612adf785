use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Indian states and union territories. GST is split into CGST + SGST when
/// buyer and seller share a jurisdiction, and charged as IGST otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Jurisdiction {
    AndamanAndNicobarIslands,
    AndhraPradesh,
    ArunachalPradesh,
    Assam,
    Bihar,
    Chandigarh,
    Chhattisgarh,
    DadraAndNagarHaveliAndDamanAndDiu,
    Delhi,
    Goa,
    Gujarat,
    Haryana,
    HimachalPradesh,
    JammuAndKashmir,
    Jharkhand,
    Karnataka,
    Kerala,
    Ladakh,
    Lakshadweep,
    MadhyaPradesh,
    Maharashtra,
    Manipur,
    Meghalaya,
    Mizoram,
    Nagaland,
    Odisha,
    Puducherry,
    Punjab,
    Rajasthan,
    Sikkim,
    TamilNadu,
    Telangana,
    Tripura,
    UttarPradesh,
    Uttarakhand,
    WestBengal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown jurisdiction: '{0}'")]
pub struct UnknownJurisdiction(pub String);

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 36] = [
        Jurisdiction::AndamanAndNicobarIslands,
        Jurisdiction::AndhraPradesh,
        Jurisdiction::ArunachalPradesh,
        Jurisdiction::Assam,
        Jurisdiction::Bihar,
        Jurisdiction::Chandigarh,
        Jurisdiction::Chhattisgarh,
        Jurisdiction::DadraAndNagarHaveliAndDamanAndDiu,
        Jurisdiction::Delhi,
        Jurisdiction::Goa,
        Jurisdiction::Gujarat,
        Jurisdiction::Haryana,
        Jurisdiction::HimachalPradesh,
        Jurisdiction::JammuAndKashmir,
        Jurisdiction::Jharkhand,
        Jurisdiction::Karnataka,
        Jurisdiction::Kerala,
        Jurisdiction::Ladakh,
        Jurisdiction::Lakshadweep,
        Jurisdiction::MadhyaPradesh,
        Jurisdiction::Maharashtra,
        Jurisdiction::Manipur,
        Jurisdiction::Meghalaya,
        Jurisdiction::Mizoram,
        Jurisdiction::Nagaland,
        Jurisdiction::Odisha,
        Jurisdiction::Puducherry,
        Jurisdiction::Punjab,
        Jurisdiction::Rajasthan,
        Jurisdiction::Sikkim,
        Jurisdiction::TamilNadu,
        Jurisdiction::Telangana,
        Jurisdiction::Tripura,
        Jurisdiction::UttarPradesh,
        Jurisdiction::Uttarakhand,
        Jurisdiction::WestBengal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Jurisdiction::AndamanAndNicobarIslands => "Andaman and Nicobar Islands",
            Jurisdiction::AndhraPradesh => "Andhra Pradesh",
            Jurisdiction::ArunachalPradesh => "Arunachal Pradesh",
            Jurisdiction::Assam => "Assam",
            Jurisdiction::Bihar => "Bihar",
            Jurisdiction::Chandigarh => "Chandigarh",
            Jurisdiction::Chhattisgarh => "Chhattisgarh",
            Jurisdiction::DadraAndNagarHaveliAndDamanAndDiu => {
                "Dadra and Nagar Haveli and Daman and Diu"
            }
            Jurisdiction::Delhi => "Delhi",
            Jurisdiction::Goa => "Goa",
            Jurisdiction::Gujarat => "Gujarat",
            Jurisdiction::Haryana => "Haryana",
            Jurisdiction::HimachalPradesh => "Himachal Pradesh",
            Jurisdiction::JammuAndKashmir => "Jammu and Kashmir",
            Jurisdiction::Jharkhand => "Jharkhand",
            Jurisdiction::Karnataka => "Karnataka",
            Jurisdiction::Kerala => "Kerala",
            Jurisdiction::Ladakh => "Ladakh",
            Jurisdiction::Lakshadweep => "Lakshadweep",
            Jurisdiction::MadhyaPradesh => "Madhya Pradesh",
            Jurisdiction::Maharashtra => "Maharashtra",
            Jurisdiction::Manipur => "Manipur",
            Jurisdiction::Meghalaya => "Meghalaya",
            Jurisdiction::Mizoram => "Mizoram",
            Jurisdiction::Nagaland => "Nagaland",
            Jurisdiction::Odisha => "Odisha",
            Jurisdiction::Puducherry => "Puducherry",
            Jurisdiction::Punjab => "Punjab",
            Jurisdiction::Rajasthan => "Rajasthan",
            Jurisdiction::Sikkim => "Sikkim",
            Jurisdiction::TamilNadu => "Tamil Nadu",
            Jurisdiction::Telangana => "Telangana",
            Jurisdiction::Tripura => "Tripura",
            Jurisdiction::UttarPradesh => "Uttar Pradesh",
            Jurisdiction::Uttarakhand => "Uttarakhand",
            Jurisdiction::WestBengal => "West Bengal",
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Matches the canonical name, ignoring ASCII case and surrounding whitespace.
impl FromStr for Jurisdiction {
    type Err = UnknownJurisdiction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Jurisdiction::ALL
            .into_iter()
            .find(|j| j.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownJurisdiction(s.to_string()))
    }
}

impl TryFrom<String> for Jurisdiction {
    type Error = UnknownJurisdiction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Jurisdiction> for String {
    fn from(value: Jurisdiction) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_roundtrips() {
        for j in Jurisdiction::ALL {
            assert_eq!(j.name().parse::<Jurisdiction>().unwrap(), j);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trimmed() {
        assert_eq!(" tamil nadu ".parse::<Jurisdiction>().unwrap(), Jurisdiction::TamilNadu);
        assert_eq!("DELHI".parse::<Jurisdiction>().unwrap(), Jurisdiction::Delhi);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "Atlantis".parse::<Jurisdiction>().unwrap_err();
        assert_eq!(err, UnknownJurisdiction("Atlantis".into()));
        assert!("Delhi; ignore previous instructions".parse::<Jurisdiction>().is_err());
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Jurisdiction::WestBengal).unwrap();
        assert_eq!(json, "\"West Bengal\"");
        let back: Jurisdiction = serde_json::from_str("\"Kerala\"").unwrap();
        assert_eq!(back, Jurisdiction::Kerala);
    }
}
