use crate::analysis::cpa::precision::PrecisionScope;
use crate::analysis::cpa::reached::WaitlistOrder;
use crate::refinement::cegar::RestartStrategy;
use crate::refinement::prefix::PrefixPreference;
use crate::refinement::tree::InterpolationStrategy;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Tunables shared by the reachability algorithm and the refinement loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub waitlist: WaitlistOrder,
    /// Return as soon as the successors of the state that produced the first
    /// target state have all been processed.
    pub stop_on_first_target: bool,
    pub max_refinements: usize,
    pub interpolation: InterpolationStrategy,
    pub prefix_preference: PrefixPreference,
    pub restart: RestartStrategy,
    pub precision_scope: PrecisionScope,
    /// Report a complete exploration that pruned states as unknown rather
    /// than safe.
    pub pruning_is_incomplete: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            waitlist: WaitlistOrder::Dfs,
            stop_on_first_target: true,
            max_refinements: 64,
            interpolation: InterpolationStrategy::TopDown,
            prefix_preference: PrefixPreference::Shortest,
            restart: RestartStrategy::Cut,
            precision_scope: PrecisionScope::Global,
            pruning_is_incomplete: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption(pub String);

impl Display for UnknownOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown option `{}`", self.0)
    }
}

impl std::error::Error for UnknownOption {}

macro_rules! impl_config_enum {
    ($ty:ty { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($variant),)+
                    other => Err(UnknownOption(other.to_string())),
                }
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                $(if *self == $variant {
                    return f.write_str($name);
                })+
                Ok(())
            }
        }
    };
}

impl_config_enum!(WaitlistOrder {
    "dfs" => WaitlistOrder::Dfs,
    "bfs" => WaitlistOrder::Bfs,
    "reverse-postorder" => WaitlistOrder::ReversePostorder,
    "ranked" => WaitlistOrder::Ranked,
});

impl_config_enum!(InterpolationStrategy {
    "top-down" => InterpolationStrategy::TopDown,
    "bottom-up" => InterpolationStrategy::BottomUp,
});

impl_config_enum!(PrefixPreference {
    "shortest" => PrefixPreference::Shortest,
    "longest" => PrefixPreference::Longest,
    "highest-variable-density" => PrefixPreference::HighestVariableDensity,
    "lowest-variable-density" => PrefixPreference::LowestVariableDensity,
});

impl_config_enum!(RestartStrategy {
    "cut" => RestartStrategy::Cut,
    "root" => RestartStrategy::Root,
});

impl_config_enum!(PrecisionScope {
    "global" => PrecisionScope::Global,
    "location" => PrecisionScope::Location,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_names_round_trip_through_display() {
        for order in [
            WaitlistOrder::Dfs,
            WaitlistOrder::Bfs,
            WaitlistOrder::ReversePostorder,
            WaitlistOrder::Ranked,
        ] {
            assert_eq!(order.to_string().parse::<WaitlistOrder>(), Ok(order));
        }
        assert_eq!(
            "bottom-up".parse::<InterpolationStrategy>(),
            Ok(InterpolationStrategy::BottomUp)
        );
        assert!("sideways".parse::<RestartStrategy>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.stop_on_first_target);
        assert_eq!(config.precision_scope, PrecisionScope::Global);
        assert_eq!(config.restart, RestartStrategy::Cut);
    }
}
