//! Order-significant enumerations stored on the ledger as `uint8` codes.
//!
//! Each enum is generated from one table so encode and decode can never
//! drift apart. Unrecognized codes read from the chain decode to
//! `Unknown(code)`; unrecognized labels are rejected; an `Unknown` value can
//! never be written.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::{LedgerError, LedgerResult};

macro_rules! ledger_code {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $code:literal => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// Code read from the ledger that this build does not know.
            Unknown(u8),
        }

        impl $name {
            /// Every known variant, in code order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// On-ledger code. `Unknown` values cannot be encoded.
            pub fn code(self) -> LedgerResult<u8> {
                match self {
                    $($name::$variant => Ok($code),)+
                    $name::Unknown(code) => Err(LedgerError::Encoding(format!(
                        "refusing to encode unknown {} code {}",
                        stringify!($name),
                        code
                    ))),
                }
            }

            pub fn from_code(code: u8) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }

            /// Code as stored, including unknown ones.
            pub fn raw_code(self) -> u8 {
                match self {
                    $($name::$variant => $code,)+
                    $name::Unknown(code) => code,
                }
            }

            pub fn label(self) -> Option<&'static str> {
                match self {
                    $($name::$variant => Some($label),)+
                    $name::Unknown(_) => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.label() {
                    Some(label) => f.write_str(label),
                    None => write!(f, "unknown({})", self.raw_code()),
                }
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $(
                    if wanted.eq_ignore_ascii_case($label) {
                        return Ok($name::$variant);
                    }
                )+
                Err(LedgerError::Encoding(format!(
                    "unrecognized {} '{}'",
                    stringify!($name),
                    s
                )))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

ledger_code! {
    /// Loan application lifecycle status.
    LoanStatus {
        Pending = 0 => "pending",
        Offered = 1 => "offered",
        Negotiating = 2 => "negotiating",
        Accepted = 3 => "accepted",
        Approved = 4 => "approved",
        Rejected = 5 => "rejected",
        Disbursed = 6 => "disbursed",
    }
}

ledger_code! {
    /// Kind of verified KYC/income document.
    DocumentType {
        Aadhaar = 0 => "aadhaar",
        Pan = 1 => "pan",
        BankStatement = 2 => "bankStatement",
        SalarySlip = 3 => "salarySlip",
    }
}

ledger_code! {
    /// Credit grade bucket.
    CreditGrade {
        APlus = 0 => "A+",
        A = 1 => "A",
        B = 2 => "B",
        C = 3 => "C",
        D = 4 => "D",
    }
}

ledger_code! {
    /// EMI installment status.
    PaymentStatus {
        Pending = 0 => "pending",
        Paid = 1 => "paid",
        Overdue = 2 => "overdue",
        Failed = 3 => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_round_trips {
        ($ty:ty) => {
            for (expected_code, value) in <$ty>::ALL.iter().enumerate() {
                let code = value.code().unwrap();
                assert_eq!(code as usize, expected_code, "{} codes must be dense", value);
                assert_eq!(<$ty>::from_code(code), *value);
                assert_eq!(value.to_string().parse::<$ty>().unwrap(), *value);
            }
        };
    }

    #[test]
    fn test_every_table_round_trips() {
        assert_round_trips!(LoanStatus);
        assert_round_trips!(DocumentType);
        assert_round_trips!(CreditGrade);
        assert_round_trips!(PaymentStatus);
    }

    #[test]
    fn test_fixed_order() {
        assert_eq!(LoanStatus::Offered.code().unwrap(), 1);
        assert_eq!(LoanStatus::Disbursed.code().unwrap(), 6);
        assert_eq!(DocumentType::SalarySlip.code().unwrap(), 3);
        assert_eq!(CreditGrade::APlus.to_string(), "A+");
        assert_eq!(PaymentStatus::Overdue.code().unwrap(), 2);
    }

    #[test]
    fn test_unknown_code_is_preserved_not_defaulted() {
        let status = LoanStatus::from_code(42);
        assert_eq!(status, LoanStatus::Unknown(42));
        assert_eq!(status.to_string(), "unknown(42)");
        assert!(matches!(status.code(), Err(LedgerError::Encoding(_))));
    }

    #[test]
    fn test_unrecognized_label_fails_loudly() {
        assert!("approvedish".parse::<LoanStatus>().is_err());
        assert!("passport".parse::<DocumentType>().is_err());
        assert!("".parse::<CreditGrade>().is_err());
    }

    #[test]
    fn test_labels_parse_case_insensitively() {
        assert_eq!("BankStatement".parse::<DocumentType>().unwrap(), DocumentType::BankStatement);
        assert_eq!("a+".parse::<CreditGrade>().unwrap(), CreditGrade::APlus);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&DocumentType::BankStatement).unwrap();
        assert_eq!(json, "\"bankStatement\"");
        let back: DocumentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DocumentType::BankStatement);
    }
}
