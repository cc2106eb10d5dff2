use std::fmt;
use std::str::FromStr;

use cpl_store::WorldState;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::AssetLedger;

/// Functions callable through the ledger's invocation surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    InitLedger,
    CreateAsset,
    ReadAsset,
    UpdateAsset,
    DeleteAsset,
    TransferAsset,
    GetAllAssets,
    AssetExists,
}

impl Function {
    pub const ALL: [Function; 8] = [
        Function::InitLedger,
        Function::CreateAsset,
        Function::ReadAsset,
        Function::UpdateAsset,
        Function::DeleteAsset,
        Function::TransferAsset,
        Function::GetAllAssets,
        Function::AssetExists,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::InitLedger => "InitLedger",
            Self::CreateAsset => "CreateAsset",
            Self::ReadAsset => "ReadAsset",
            Self::UpdateAsset => "UpdateAsset",
            Self::DeleteAsset => "DeleteAsset",
            Self::TransferAsset => "TransferAsset",
            Self::GetAllAssets => "GetAllAssets",
            Self::AssetExists => "AssetExists",
        }
    }

    /// Number of positional string arguments.
    pub fn arity(&self) -> usize {
        match self {
            Self::InitLedger | Self::GetAllAssets => 0,
            Self::ReadAsset | Self::DeleteAsset | Self::AssetExists => 1,
            Self::TransferAsset => 2,
            Self::CreateAsset | Self::UpdateAsset => 5,
        }
    }

    /// `true` for functions that never write state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::ReadAsset | Self::GetAllAssets | Self::AssetExists
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| LedgerError::UnknownFunction(s.to_string()))
    }
}

/// Run a named ledger function with positional string arguments.
///
/// The returned bytes are what a client receives as the transaction result:
/// JSON for records and listings, the bare previous owner for
/// `TransferAsset`, `true`/`false` for `AssetExists`, and nothing for
/// `InitLedger` and `DeleteAsset`.
pub fn invoke<S: WorldState + ?Sized>(
    state: &mut S,
    function: &str,
    args: &[String],
) -> LedgerResult<Vec<u8>> {
    let function: Function = function.parse()?;
    if args.len() != function.arity() {
        return Err(LedgerError::Arity {
            function: function.name(),
            expected: function.arity(),
            actual: args.len(),
        });
    }

    let mut ledger = AssetLedger::new(state);

    match function {
        Function::InitLedger => {
            ledger.init()?;
            Ok(Vec::new())
        }
        Function::CreateAsset => {
            let asset = ledger.create(&args[0], &args[1], &args[2], &args[3], &args[4])?;
            encode(&asset)
        }
        Function::ReadAsset => ledger.read(&args[0]),
        Function::UpdateAsset => {
            let asset = ledger.update(&args[0], &args[1], &args[2], &args[3], &args[4])?;
            encode(&asset)
        }
        Function::DeleteAsset => {
            ledger.delete(&args[0])?;
            Ok(Vec::new())
        }
        Function::TransferAsset => Ok(ledger.transfer(&args[0], &args[1])?.into_bytes()),
        Function::GetAllAssets => encode(&ledger.list()?),
        Function::AssetExists => encode(&ledger.exists(&args[0])?),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> LedgerResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpl_store::MemoryState;
    use cpl_types::Asset;
    use serde_json::Value;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn names_round_trip() {
        for f in Function::ALL {
            assert_eq!(f.name().parse::<Function>().unwrap(), f);
        }
    }

    #[test]
    fn unknown_function_rejected() {
        let mut state = MemoryState::new();
        let err = invoke(&mut state, "BurnAsset", &[]).unwrap_err();
        assert_eq!(err, LedgerError::UnknownFunction("BurnAsset".into()));
    }

    #[test]
    fn wrong_arity_rejected() {
        let mut state = MemoryState::new();
        let err = invoke(&mut state, "ReadAsset", &[]).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Arity {
                function: "ReadAsset",
                expected: 1,
                actual: 0
            }
        );
    }

    #[test]
    fn create_and_read_through_surface() {
        let mut state = MemoryState::new();
        let created = invoke(
            &mut state,
            "CreateAsset",
            &args(&["a1", "agroforestry", "200", "farmer08", "2025-08-03"]),
        )
        .unwrap();
        let read = invoke(&mut state, "ReadAsset", &args(&["a1"])).unwrap();
        assert_eq!(created, read);
        let asset: Asset = serde_json::from_slice(&read).unwrap();
        assert_eq!(asset.carbon_credits, Some(200));
    }

    #[test]
    fn transfer_returns_bare_owner() {
        let mut state = MemoryState::new();
        invoke(&mut state, "InitLedger", &[]).unwrap();
        let out = invoke(&mut state, "TransferAsset", &args(&["carbonAsset3", "buyer1"])).unwrap();
        assert_eq!(out, b"nyeri_farmer08");
    }

    #[test]
    fn get_all_assets_after_init_twice() {
        let mut state = MemoryState::new();
        invoke(&mut state, "InitLedger", &[]).unwrap();
        let first = invoke(&mut state, "GetAllAssets", &[]).unwrap();
        invoke(&mut state, "InitLedger", &[]).unwrap();
        let second = invoke(&mut state, "GetAllAssets", &[]).unwrap();
        assert_eq!(first, second);
        let list: Vec<Value> = serde_json::from_slice(&second).unwrap();
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn exists_and_delete() {
        let mut state = MemoryState::new();
        invoke(&mut state, "InitLedger", &[]).unwrap();
        assert_eq!(invoke(&mut state, "AssetExists", &args(&["carbonAsset1"])).unwrap(), b"true");
        assert!(invoke(&mut state, "DeleteAsset", &args(&["carbonAsset1"])).unwrap().is_empty());
        assert_eq!(invoke(&mut state, "AssetExists", &args(&["carbonAsset1"])).unwrap(), b"false");
    }

    #[test]
    fn update_missing_is_not_found() {
        let mut state = MemoryState::new();
        let err = invoke(
            &mut state,
            "UpdateAsset",
            &args(&["missing", "tree-planting", "50", "farmerX", "2025-08-01"]),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
