use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string literal is both the database representation and the serde
/// rename, so wire and storage forms always agree.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "PATIENT",
    Doctor => "DOCTOR",
    Admin => "ADMIN",
});

str_enum!(ConsultationStatus {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    AwaitingResponse => "AWAITING_RESPONSE",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

str_enum!(MessageType {
    Text => "TEXT",
    Video => "VIDEO",
    Image => "IMAGE",
    Document => "DOCUMENT",
});

str_enum!(NotificationChannel {
    Sms => "SMS",
    WhatsApp => "WHATSAPP",
    Email => "EMAIL",
});

str_enum!(Priority {
    Low => "low",
    Normal => "normal",
    High => "high",
    Urgent => "urgent",
});

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}
