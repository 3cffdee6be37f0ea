//! Survey record types - periodic data collected per member and per group
//!
//! Survey records are append-only: they are created once and only removed
//! when their owning member or group is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{now, Entity, Gender, MaritalStatus};
use crate::core::identity::{EntityId, EntityPrefix};

/// Maximum number of child entries on a children status record
pub const MAX_CHILDREN: usize = 5;

crate::text_enum! {
    /// Income-generating activity category
    pub enum IgaActivity as "IGA activity" {
        Agriculture => "agriculture",
        PettyTrading => "petty_trading",
        Manufacturing => "manufacturing",
        Service => "service",
        Others => "others",
    }
}

crate::text_enum! {
    /// Where a non-SHG loan came from
    pub enum LoanSource as "loan source" {
        Cla => "cla",
        MicroFinance => "micro_finance",
        Bank => "bank",
        LocalMoneyLenders => "local_money_lenders",
        Others => "others",
    }
}

crate::text_enum! {
    pub enum LoanPurpose as "loan purpose" {
        Iga => "iga",
        SocialEvents => "social_events",
        Furniture => "furniture",
        Education => "education",
        Others => "others",
    }
}

crate::text_enum! {
    /// Degree of participation in a decision
    pub enum DecisionMaking as "decision making" {
        Informed => "informed",
        Consulted => "consulted",
        Consent => "consent",
    }
}

crate::text_enum! {
    pub enum Housing as "housing" {
        MetalSheet => "metal_sheet",
        Wood => "wood",
        Mud => "mud",
        Bricks => "bricks",
        Concrete => "concrete",
        Others => "others",
    }
}

crate::text_enum! {
    pub enum DrinkingWater as "drinking water source" {
        PipedInside => "piped_inside",
        PipedOutside => "piped_outside",
        WaterPoint => "water_point",
        ProtectedWell => "protected_well",
        UnprotectedWell => "unprotected_well",
        RiverStream => "river_stream",
        Other => "other",
    }
}

crate::text_enum! {
    pub enum SchoolStatus as "school status" {
        Enrolled => "enrolled",
        NotEnrolled => "not_enrolled",
        DroppedOut => "dropped_out",
        Graduated => "graduated",
    }
}

/// Six-month member survey: income-generating activity, loans, nutrition, health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SixMonthData {
    pub id: EntityId,
    pub member: EntityId,

    #[serde(default)]
    pub active_iga: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iga_activity: Option<IgaActivity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iga_capital: Option<f64>,

    /// Loan amount received from the SHG during the period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_from_shg: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_source: Option<LoanSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_from_other_sources: Option<f64>,

    pub purpose_of_loan: LoanPurpose,

    pub monthly_personal_income: f64,
    pub monthly_household_income: f64,

    pub meals_children: u32,
    pub meals_adults: u32,

    pub diarrhea_days_children: u32,
    pub illness_days_children: u32,
    pub diarrhea_days_others: u32,
    pub illness_days_others: u32,

    pub created_at: DateTime<Utc>,
}

impl SixMonthData {
    pub fn new(member: EntityId, purpose_of_loan: LoanPurpose) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Six),
            member,
            active_iga: false,
            iga_activity: None,
            iga_capital: None,
            loan_from_shg: None,
            loan_source: None,
            loan_from_other_sources: None,
            purpose_of_loan,
            monthly_personal_income: 0.0,
            monthly_household_income: 0.0,
            meals_children: 0,
            meals_adults: 0,
            diarrhea_days_children: 0,
            illness_days_children: 0,
            diarrhea_days_others: 0,
            illness_days_others: 0,
            created_at: now(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("iga_capital", self.iga_capital),
            ("loan_from_shg", self.loan_from_shg),
            ("loan_from_other_sources", self.loan_from_other_sources),
            ("monthly_personal_income", Some(self.monthly_personal_income)),
            ("monthly_household_income", Some(self.monthly_household_income)),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    errors.push(format!("{} must be a non-negative amount", name));
                }
            }
        }
        if self.loan_from_other_sources.is_some() && self.loan_source.is_none() {
            errors.push("loan_source is required when loan_from_other_sources is set".to_string());
        }
        errors
    }
}

/// Annual member survey: household, savings, assets, living conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualData {
    pub id: EntityId,
    pub member: EntityId,

    pub age: u32,
    pub gender: Gender,
    pub education_level: String,
    pub marital_status: MaritalStatus,
    pub family_size: u32,
    pub household_size: u32,
    pub total_savings: f64,
    pub loan_rounds: u32,

    /// Estimated value of household assets
    pub asset_value: f64,

    pub household_decision: DecisionMaking,
    pub community_decision: DecisionMaking,

    pub mortality_under_5: u32,
    pub mortality_other: u32,

    pub housing: Housing,

    #[serde(default)]
    pub has_latrine: bool,

    #[serde(default)]
    pub has_electricity: bool,

    pub drinking_water: DrinkingWater,

    pub created_at: DateTime<Utc>,
}

impl AnnualData {
    /// Create a record with neutral answers; callers fill in the survey values
    pub fn new(member: EntityId, age: u32, gender: Gender) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ann),
            member,
            age,
            gender,
            education_level: String::new(),
            marital_status: MaritalStatus::Married,
            family_size: 0,
            household_size: 0,
            total_savings: 0.0,
            loan_rounds: 0,
            asset_value: 0.0,
            household_decision: DecisionMaking::Informed,
            community_decision: DecisionMaking::Informed,
            mortality_under_5: 0,
            mortality_other: 0,
            housing: Housing::Others,
            has_latrine: false,
            has_electricity: false,
            drinking_water: DrinkingWater::Other,
            created_at: now(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.total_savings.is_finite() || self.total_savings < 0.0 {
            errors.push("total_savings must be a non-negative amount".to_string());
        }
        if !self.asset_value.is_finite() || self.asset_value < 0.0 {
            errors.push("asset_value must be a non-negative amount".to_string());
        }
        if self.household_size > self.family_size && self.family_size > 0 {
            errors.push("household_size cannot exceed family_size".to_string());
        }
        errors
    }
}

/// One child on a children status record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_status: Option<SchoolStatus>,
}

/// Annual children status survey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualChildrenStatus {
    pub id: EntityId,
    pub member: EntityId,

    pub number_of_children: u32,

    /// Up to five children
    #[serde(default)]
    pub children: Vec<ChildEntry>,

    pub created_at: DateTime<Utc>,
}

impl AnnualChildrenStatus {
    pub fn new(member: EntityId, number_of_children: u32) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Chs),
            member,
            number_of_children,
            children: Vec::new(),
            created_at: now(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.children.len() > MAX_CHILDREN {
            errors.push(format!(
                "At most {} children can be recorded, got {}",
                MAX_CHILDREN,
                self.children.len()
            ));
        }
        if self.children.len() as u32 > self.number_of_children {
            errors.push("More child entries than number_of_children".to_string());
        }
        errors
    }
}

/// Annual group survey: savings, capital, loans and social support
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualSelfHelpGroupData {
    pub id: EntityId,
    pub group: EntityId,

    pub regular_saving: f64,
    pub shg_capital: f64,
    pub members_with_loans: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smallest_loan: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub largest_loan: Option<f64>,

    #[serde(default)]
    pub loans_written_off: f64,

    #[serde(default)]
    pub invested_in_group_iga: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_iga_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub social_savings_income: f64,

    #[serde(default)]
    pub social_savings_expenditure: f64,

    #[serde(default)]
    pub members_social_support: u32,

    #[serde(default)]
    pub outsiders_social_support: u32,

    #[serde(default)]
    pub supporting_institutions: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_monthly_personal: Option<f64>,

    #[serde(default)]
    pub trainings_per_year: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_health_support: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_health_support: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_insurance_need: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_social_need: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub others: Option<f64>,

    pub created_at: DateTime<Utc>,
}

impl AnnualSelfHelpGroupData {
    pub fn new(group: EntityId, regular_saving: f64, shg_capital: f64) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Agd),
            group,
            regular_saving,
            shg_capital,
            members_with_loans: 0,
            smallest_loan: None,
            largest_loan: None,
            loans_written_off: 0.0,
            invested_in_group_iga: 0.0,
            group_iga_code: None,
            description: None,
            social_savings_income: 0.0,
            social_savings_expenditure: 0.0,
            members_social_support: 0,
            outsiders_social_support: 0,
            supporting_institutions: 0,
            min_monthly_personal: None,
            trainings_per_year: 0,
            member_health_support: None,
            other_health_support: None,
            other_insurance_need: None,
            other_social_need: None,
            others: None,
            created_at: now(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let (Some(lo), Some(hi)) = (self.smallest_loan, self.largest_loan) {
            if lo > hi {
                errors.push("smallest_loan cannot exceed largest_loan".to_string());
            }
        }
        for (name, value) in [
            ("regular_saving", Some(self.regular_saving)),
            ("shg_capital", Some(self.shg_capital)),
            ("smallest_loan", self.smallest_loan),
            ("largest_loan", self.largest_loan),
            ("loans_written_off", Some(self.loans_written_off)),
            ("invested_in_group_iga", Some(self.invested_in_group_iga)),
            ("social_savings_income", Some(self.social_savings_income)),
            ("social_savings_expenditure", Some(self.social_savings_expenditure)),
            ("min_monthly_personal", self.min_monthly_personal),
            ("member_health_support", self.member_health_support),
            ("other_health_support", self.other_health_support),
            ("other_insurance_need", self.other_insurance_need),
            ("other_social_need", self.other_social_need),
            ("others", self.others),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    errors.push(format!("{} must be a non-negative amount", name));
                }
            }
        }
        errors
    }
}

macro_rules! survey_entity {
    ($ty:ty, $prefix:literal, $owner:ident) => {
        impl Entity for $ty {
            const PREFIX: &'static str = $prefix;

            fn id(&self) -> &EntityId {
                &self.id
            }

            fn label(&self) -> String {
                format!("{} for {}", $prefix, self.$owner)
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

survey_entity!(SixMonthData, "SIX", member);
survey_entity!(AnnualData, "ANN", member);
survey_entity!(AnnualChildrenStatus, "CHS", member);
survey_entity!(AnnualSelfHelpGroupData, "AGD", group);
