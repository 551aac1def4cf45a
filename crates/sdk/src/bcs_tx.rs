//! Minimal BCS encoding of a programmable transaction for dev-inspect.
//!
//! Only what the view calls need: pure and shared-object inputs and a single
//! `MoveCall` command. Enum tags and vector lengths are ULEB128, integers are
//! little-endian, addresses are 32 raw bytes.

use biblestudy_types::codec::{write_bytes, write_uleb128};

use crate::client::Address;

// TransactionKind::ProgrammableTransaction
const TX_KIND_PROGRAMMABLE: u64 = 0;
// CallArg variants
const CALL_ARG_PURE: u64 = 0;
const CALL_ARG_OBJECT: u64 = 1;
// ObjectArg::SharedObject
const OBJECT_ARG_SHARED: u64 = 1;
// Command::MoveCall
const COMMAND_MOVE_CALL: u64 = 0;
// Argument::Input
const ARGUMENT_INPUT: u64 = 1;

/// One transaction input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    /// BCS bytes of a pure value
    Pure(Vec<u8>),
    SharedObject {
        id: Address,
        initial_shared_version: u64,
        mutable: bool,
    },
}

impl CallArg {
    pub fn address(address: &Address) -> Self {
        CallArg::Pure(address.as_bytes().to_vec())
    }

    pub fn u64(value: u64) -> Self {
        CallArg::Pure(value.to_le_bytes().to_vec())
    }

    /// Immutable reference to a shared object
    pub fn shared(id: Address, initial_shared_version: u64) -> Self {
        CallArg::SharedObject {
            id,
            initial_shared_version,
            mutable: false,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            CallArg::Pure(bytes) => {
                write_uleb128(out, CALL_ARG_PURE);
                write_bytes(out, bytes);
            }
            CallArg::SharedObject {
                id,
                initial_shared_version,
                mutable,
            } => {
                write_uleb128(out, CALL_ARG_OBJECT);
                write_uleb128(out, OBJECT_ARG_SHARED);
                out.extend_from_slice(id.as_bytes());
                out.extend_from_slice(&initial_shared_version.to_le_bytes());
                out.push(u8::from(*mutable));
            }
        }
    }
}

/// A single-command programmable transaction calling one Move function with
/// every input passed positionally.
#[derive(Debug, Clone)]
pub struct MoveCall {
    pub package: Address,
    pub module: String,
    pub function: String,
    pub inputs: Vec<CallArg>,
}

impl MoveCall {
    pub fn new(package: Address, module: &str, function: &str) -> Self {
        Self {
            package,
            module: module.to_string(),
            function: function.to_string(),
            inputs: Vec::new(),
        }
    }

    pub fn arg(mut self, input: CallArg) -> Self {
        self.inputs.push(input);
        self
    }

    /// `TransactionKind` bytes as expected by `sui_devInspectTransactionBlock`
    pub fn to_transaction_kind_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        write_uleb128(&mut out, TX_KIND_PROGRAMMABLE);

        write_uleb128(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(&mut out);
        }

        // commands: exactly one MoveCall
        write_uleb128(&mut out, 1);
        write_uleb128(&mut out, COMMAND_MOVE_CALL);
        out.extend_from_slice(self.package.as_bytes());
        write_bytes(&mut out, self.module.as_bytes());
        write_bytes(&mut out, self.function.as_bytes());
        // no type arguments
        write_uleb128(&mut out, 0);
        write_uleb128(&mut out, self.inputs.len() as u64);
        for index in 0..self.inputs.len() {
            write_uleb128(&mut out, ARGUMENT_INPUT);
            out.extend_from_slice(&(index as u16).to_le_bytes());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_move_call_layout() {
        let package = addr("0xabc");
        let sender = addr("0x1234");
        let call = MoveCall::new(package, "biblestudy", "get_progress_for_week")
            .arg(CallArg::shared(addr("0x77"), 9))
            .arg(CallArg::address(&sender))
            .arg(CallArg::u64(2_819));

        let bytes = call.to_transaction_kind_bytes();
        let mut expected = vec![0x00, 0x03];
        // shared object input
        expected.extend_from_slice(&[0x01, 0x01]);
        expected.extend_from_slice(addr("0x77").as_bytes());
        expected.extend_from_slice(&9u64.to_le_bytes());
        expected.push(0x00);
        // pure address
        expected.extend_from_slice(&[0x00, 0x20]);
        expected.extend_from_slice(sender.as_bytes());
        // pure u64
        expected.extend_from_slice(&[0x00, 0x08]);
        expected.extend_from_slice(&2_819u64.to_le_bytes());
        // one MoveCall
        expected.extend_from_slice(&[0x01, 0x00]);
        expected.extend_from_slice(package.as_bytes());
        expected.push(10);
        expected.extend_from_slice(b"biblestudy");
        expected.push(21);
        expected.extend_from_slice(b"get_progress_for_week");
        expected.push(0x00);
        expected.push(0x03);
        for index in 0u16..3 {
            expected.push(0x01);
            expected.extend_from_slice(&index.to_le_bytes());
        }

        assert_eq!(bytes, expected);
    }
}
