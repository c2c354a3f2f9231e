//! Records exchanged with the booking backend, plus the checks the dashboard
//! forms run before anything is sent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MAX_NAME_LEN:  usize = 120;
const MAX_REPLY_LEN: usize = 1000;

// ─── Validation errors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("{0} is too long")]
    TooLong(&'static str),
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Phone number must have 9 to 11 digits")]
    InvalidPhone,
    #[error("Start date must not be after end date")]
    InvertedDates,
    #[error("Refund percent must be between 0 and 100")]
    RefundOutOfRange,
    #[error("Refund tiers must be ordered by days before check-in, with decreasing refunds")]
    UnorderedTiers,
    #[error("Rating score must be between 1 and 5")]
    ScoreOutOfRange,
}

fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if v.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong(field));
    }
    Ok(())
}

// ─── Homestays ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HomestayStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homestay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id:          Option<String>,
    pub name:        String,
    pub address:     String,
    #[serde(default)]
    pub description: Option<String>,
    pub max_guests:  u32,
    pub base_price:  f64,
    #[serde(default)]
    pub status:      HomestayStatus,
}

impl Homestay {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, "Name")?;
        require_text(&self.address, "Address")?;
        if self.max_guests == 0 {
            return Err(ValidationError::NotPositive("Maximum guests"));
        }
        if !(self.base_price > 0.0) {
            return Err(ValidationError::NotPositive("Base price"));
        }
        Ok(())
    }
}

// ─── Staff ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id:          Option<String>,
    pub homestay_id: String,
    pub full_name:   String,
    pub email:       String,
    pub phone:       String,
    #[serde(default)]
    pub role:        Option<String>,
}

impl Staff {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.full_name, "Full name")?;
        if !is_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if !is_phone(&self.phone) {
            return Err(ValidationError::InvalidPhone);
        }
        Ok(())
    }
}

fn is_email(s: &str) -> bool {
    let s = s.trim();
    let Some((local, domain)) = s.split_once('@') else { return false };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

/// Digits with optional spaces, dashes and a leading `+`.
fn is_phone(s: &str) -> bool {
    let s = s.trim();
    let body = s.strip_prefix('+').unwrap_or(s);
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return false;
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (9..=11).contains(&digits)
}

// ─── Pricing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id:          Option<String>,
    pub homestay_id: String,
    pub label:       String,
    pub start_date:  NaiveDate,
    pub end_date:    NaiveDate,
    pub price:       f64,
}

impl PricingRule {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.label, "Label")?;
        if self.start_date > self.end_date {
            return Err(ValidationError::InvertedDates);
        }
        if !(self.price > 0.0) {
            return Err(ValidationError::NotPositive("Price"));
        }
        Ok(())
    }
}

// ─── Cancellation policy ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundTier {
    /// Minimum days between cancellation and check-in.
    pub days_before:    u32,
    pub refund_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationPolicy {
    pub homestay_id: String,
    pub tiers:       Vec<RefundTier>,
}

impl CancellationPolicy {
    /// Tiers run from the earliest cancellation to the latest: `days_before`
    /// strictly decreasing, `refund_percent` never increasing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tiers.is_empty() {
            return Err(ValidationError::Empty("Refund tiers"));
        }
        if self.tiers.iter().any(|t| t.refund_percent > 100) {
            return Err(ValidationError::RefundOutOfRange);
        }
        let ordered = self.tiers.windows(2).all(|w| {
            w[0].days_before > w[1].days_before && w[0].refund_percent >= w[1].refund_percent
        });
        if !ordered {
            return Err(ValidationError::UnorderedTiers);
        }
        Ok(())
    }

    /// Refund granted when cancelling `days_before` check-in.
    pub fn refund_for(&self, days_before: u32) -> u8 {
        self.tiers.iter()
            .find(|t| days_before >= t.days_before)
            .map(|t| t.refund_percent)
            .unwrap_or(0)
    }
}

// ─── Ratings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id:          String,
    pub homestay_id: String,
    pub guest_name:  String,
    pub score:       u8,
    #[serde(default)]
    pub comment:     Option<String>,
    #[serde(default)]
    pub reply:       Option<String>,
    pub created_at:  String,
}

impl Rating {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.score) {
            return Err(ValidationError::ScoreOutOfRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingReply {
    pub reply: String,
}

impl RatingReply {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let r = self.reply.trim();
        if r.is_empty() {
            return Err(ValidationError::Empty("Reply"));
        }
        if r.chars().count() > MAX_REPLY_LEN {
            return Err(ValidationError::TooLong("Reply"));
        }
        Ok(())
    }
}

// ─── Dashboard statistics ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date:     NaiveDate,
    pub bookings: u64,
    pub revenue:  f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_bookings:     u64,
    pub cancelled_bookings: u64,
    pub total_revenue:      f64,
    /// 0.0 to 1.0
    pub occupancy_rate:     f64,
    pub average_rating:     Option<f64>,
    pub daily:              Vec<DailyStat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn homestay() -> Homestay {
        Homestay {
            id: None,
            name: "Hill Cabin".into(),
            address: "12 Pine Rd, Da Lat".into(),
            description: None,
            max_guests: 4,
            base_price: 850_000.0,
            status: HomestayStatus::Active,
        }
    }

    fn staff() -> Staff {
        Staff {
            id: None,
            homestay_id: "h1".into(),
            full_name: "Lan Nguyen".into(),
            email: "lan@example.com".into(),
            phone: "+84 912-345-678".into(),
            role: Some("cleaner".into()),
        }
    }

    #[test]
    fn homestay_checks() {
        assert_eq!(homestay().validate(), Ok(()));

        let mut h = homestay();
        h.name = "   ".into();
        assert_eq!(h.validate(), Err(ValidationError::Empty("Name")));

        let mut h = homestay();
        h.max_guests = 0;
        assert_eq!(h.validate(), Err(ValidationError::NotPositive("Maximum guests")));

        let mut h = homestay();
        h.base_price = f64::NAN;
        assert_eq!(h.validate(), Err(ValidationError::NotPositive("Base price")));

        let mut h = homestay();
        h.address = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(h.validate(), Err(ValidationError::TooLong("Address")));
    }

    #[test]
    fn staff_contact_checks() {
        assert_eq!(staff().validate(), Ok(()));

        for bad in ["lan", "lan@", "@example.com", "lan@example", "lan@@example.com", "l an@example.com"] {
            let mut s = staff();
            s.email = bad.into();
            assert_eq!(s.validate(), Err(ValidationError::InvalidEmail), "{bad}");
        }
        for bad in ["12345", "091234567890", "09x1234567", "++84912345678"] {
            let mut s = staff();
            s.phone = bad.into();
            assert_eq!(s.validate(), Err(ValidationError::InvalidPhone), "{bad}");
        }
    }

    #[test]
    fn pricing_dates_must_be_ordered() {
        let rule = PricingRule {
            id: None,
            homestay_id: "h1".into(),
            label: "Tet".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 25).unwrap(),
            price: 1_200_000.0,
        };
        assert_eq!(rule.validate(), Err(ValidationError::InvertedDates));

        let single_day = PricingRule { end_date: rule.start_date, ..rule };
        assert_eq!(single_day.validate(), Ok(()));
    }

    #[test]
    fn cancellation_tiers() {
        let mut policy = CancellationPolicy {
            homestay_id: "h1".into(),
            tiers: vec![
                RefundTier { days_before: 14, refund_percent: 100 },
                RefundTier { days_before: 7,  refund_percent: 50 },
                RefundTier { days_before: 0,  refund_percent: 0 },
            ],
        };
        assert_eq!(policy.validate(), Ok(()));
        assert_eq!(policy.refund_for(30), 100);
        assert_eq!(policy.refund_for(10), 50);
        assert_eq!(policy.refund_for(2), 0);

        policy.tiers[1].refund_percent = 120;
        assert_eq!(policy.validate(), Err(ValidationError::RefundOutOfRange));

        policy.tiers[1] = RefundTier { days_before: 20, refund_percent: 50 };
        assert_eq!(policy.validate(), Err(ValidationError::UnorderedTiers));

        policy.tiers.clear();
        assert_eq!(policy.validate(), Err(ValidationError::Empty("Refund tiers")));
    }

    #[test]
    fn reply_and_score_bounds() {
        assert!(RatingReply { reply: "Thank you!".into() }.validate().is_ok());
        assert_eq!(
            RatingReply { reply: " ".into() }.validate(),
            Err(ValidationError::Empty("Reply")),
        );
        assert_eq!(
            RatingReply { reply: "a".repeat(MAX_REPLY_LEN + 1) }.validate(),
            Err(ValidationError::TooLong("Reply")),
        );

        let r: Rating = serde_json::from_str(
            r#"{"id":"r1","homestayId":"h1","guestName":"Minh","score":6,"createdAt":"2025-03-01"}"#,
        ).unwrap();
        assert_eq!(r.validate(), Err(ValidationError::ScoreOutOfRange));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = serde_json::to_value(homestay()).unwrap();
        assert_eq!(json["maxGuests"], 4);
        assert_eq!(json["status"], "ACTIVE");
        assert!(json.get("id").is_none());

        let stats: DashboardStats = serde_json::from_str(
            r#"{"totalBookings":3,"totalRevenue":2.5e6,"daily":[{"date":"2024-02-01","bookings":3,"revenue":2.5e6}]}"#,
        ).unwrap();
        assert_eq!(stats.total_bookings, 3);
        assert_eq!(stats.cancelled_bookings, 0);
        assert_eq!(stats.average_rating, None);
        assert_eq!(stats.daily[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
