//! Fixed choice sets used by product attributes.
//!
//! Each choice has a stable wire value (what clients submit and receive) and
//! a human-readable label (what the dashboard shows in a select box).

use myshop_core::DomainError;

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($value:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// `(value, label)` pairs in declaration order.
            pub fn choices() -> Vec<(&'static str, &'static str)> {
                Self::ALL.iter().map(|c| (c.as_str(), c.label())).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.as_str() == s)
                    .ok_or_else(|| DomainError::validation(format!("\"{s}\" is not a valid choice.")))
            }
        }
    };
}

choice_enum! {
    /// Memory card form factor.
    CardType {
        Sd => ("SD", "SD"),
        Sdxc => ("SDXC", "SDXC"),
        Sdhc => ("SDHC", "SDHC"),
        SdhcII => ("SDHC II", "SDHC II"),
    }
}

choice_enum! {
    /// Transfer speed class of a memory card.
    Speed {
        Mb4 => ("4", "4 MB/s"),
        Mb20 => ("20", "20 MB/s"),
        Mb30 => ("30", "30 MB/s"),
        Mb40 => ("40", "40 MB/s"),
        Mb48 => ("48", "48 MB/s"),
        Mb80 => ("80", "80 MB/s"),
        Mb95 => ("95", "95 MB/s"),
        Mb280 => ("280", "280 MB/s"),
    }
}

choice_enum! {
    BatteryType {
        LithiumPolymer => ("li-poly", "Lithium Polymer (Li-Poly)"),
        LithiumIon => ("li-ion", "Lithium Ion (Li-Ion)"),
    }
}

choice_enum! {
    WifiConnectivity {
        None => ("none", "None"),
        Bgn => ("802.11 b/g/n", "802.11 b/g/n"),
        Ac => ("802.11 a/b/g/n/ac", "802.11 a/b/g/n/ac"),
    }
}

choice_enum! {
    Bluetooth {
        None => ("none", "None"),
        V21 => ("bt-2.1", "Bluetooth 2.1"),
        V30 => ("bt-3.0", "Bluetooth 3.0"),
        V40 => ("bt-4.0", "Bluetooth 4.0"),
    }
}
