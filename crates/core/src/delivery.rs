//! Delivery districts and charges.

use rust_decimal::Decimal;

/// Every district customers can pick at checkout, in display order.
pub const DISTRICTS: [&str; 64] = [
    "Dhaka",
    "Chittagong",
    "Rajshahi",
    "Khulna",
    "Barisal",
    "Sylhet",
    "Rangpur",
    "Mymensingh",
    "Comilla",
    "Narayanganj",
    "Gazipur",
    "Tangail",
    "Jamalpur",
    "Sherpur",
    "Netrokona",
    "Kishoreganj",
    "Manikganj",
    "Munshiganj",
    "Narsingdi",
    "Faridpur",
    "Gopalganj",
    "Madaripur",
    "Rajbari",
    "Shariatpur",
    "Brahmanbaria",
    "Chandpur",
    "Lakshmipur",
    "Noakhali",
    "Feni",
    "Cox's Bazar",
    "Bandarban",
    "Rangamati",
    "Khagrachhari",
    "Patuakhali",
    "Pirojpur",
    "Jhalokati",
    "Barguna",
    "Bhola",
    "Jessore",
    "Narail",
    "Magura",
    "Satkhira",
    "Bagerhat",
    "Meherpur",
    "Chuadanga",
    "Kushtia",
    "Jhenaidah",
    "Bogra",
    "Joypurhat",
    "Naogaon",
    "Natore",
    "Chapainawabganj",
    "Pabna",
    "Sirajganj",
    "Habiganj",
    "Moulvibazar",
    "Sunamganj",
    "Kurigram",
    "Lalmonirhat",
    "Nilphamari",
    "Panchagarh",
    "Thakurgaon",
    "Dinajpur",
    "Gaibandha",
];

/// Districts charged the inside-Dhaka rate.
pub const DHAKA_ZONE: [&str; 6] = [
    "Dhaka",
    "Narayanganj",
    "Gazipur",
    "Manikganj",
    "Munshiganj",
    "Narsingdi",
];

/// District preselected on the checkout form.
pub const DEFAULT_DISTRICT: &str = "Dhaka";

const INSIDE_DHAKA_CHARGE: i64 = 60;
const OUTSIDE_DHAKA_CHARGE: i64 = 120;

/// Pricing zone for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryZone {
    InsideDhaka,
    OutsideDhaka,
}

impl DeliveryZone {
    /// Zone of a district. Unknown districts ship at the outside rate.
    #[must_use]
    pub fn for_district(district: &str) -> Self {
        if DHAKA_ZONE.contains(&district.trim()) {
            Self::InsideDhaka
        } else {
            Self::OutsideDhaka
        }
    }

    #[must_use]
    pub fn charge(&self) -> Decimal {
        match self {
            Self::InsideDhaka => Decimal::from(INSIDE_DHAKA_CHARGE),
            Self::OutsideDhaka => Decimal::from(OUTSIDE_DHAKA_CHARGE),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InsideDhaka => "Inside Dhaka",
            Self::OutsideDhaka => "Outside Dhaka",
        }
    }
}

/// Delivery charge for a district: 60 inside the Dhaka zone, 120 elsewhere.
#[must_use]
pub fn delivery_charge(district: &str) -> Decimal {
    DeliveryZone::for_district(district).charge()
}

/// Whether the district is on the list (exact match after trimming).
#[must_use]
pub fn is_known_district(district: &str) -> bool {
    DISTRICTS.contains(&district.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_inside_dhaka() {
        for district in DHAKA_ZONE {
            assert_eq!(delivery_charge(district), Decimal::from(60));
        }
        assert_eq!(
            DeliveryZone::for_district("Gazipur").label(),
            "Inside Dhaka"
        );
    }

    #[test]
    fn test_outside_dhaka() {
        assert_eq!(delivery_charge("Chittagong"), Decimal::from(120));
        assert_eq!(delivery_charge("Atlantis"), Decimal::from(120));
        assert_eq!(delivery_charge("dhaka"), Decimal::from(120));
    }

    #[test]
    fn test_district_list() {
        let unique: HashSet<_> = DISTRICTS.iter().collect();
        assert_eq!(unique.len(), DISTRICTS.len());
        assert!(DHAKA_ZONE.iter().all(|d| is_known_district(d)));
        assert!(is_known_district(" Cox's Bazar "));
        assert!(!is_known_district("Narnia"));
    }
}
