//! Transaction envelopes and their builders.
//!
//! Transactions are plain values: a [`TransactionType`] tag plus a typed
//! payload. Building one has no side effects; the signing engine is what
//! executes them. On the wire an envelope is the canonical CBOR map
//! `{"type": <u8>, "payload": {...}}`.

use chaintree_core::{decode_value, encode_value, ContentId, CoreError, Did, Node, Value};

use crate::error::Result;

/// Discriminator for transaction payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransactionType {
    EstablishToken = 1,
    MintToken = 2,
    SendToken = 3,
    ReceiveToken = 4,
    SetData = 5,
    SetOwnership = 6,
}

impl TransactionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::EstablishToken),
            2 => Some(Self::MintToken),
            3 => Some(Self::SendToken),
            4 => Some(Self::ReceiveToken),
            5 => Some(Self::SetData),
            6 => Some(Self::SetOwnership),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Write `value` at `path` under the tree's data.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDataPayload {
    pub path: String,
    pub value: Value,
}

/// Replace the tree's authentication list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOwnershipPayload {
    pub authentication: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstablishTokenPayload {
    pub name: String,
    pub max_supply: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintTokenPayload {
    pub name: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTokenPayload {
    pub id: String,
    /// Canonical token name, `<owner did>:<name>`.
    pub name: String,
    pub amount: u64,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveTokenPayload {
    pub send_token_transaction_id: String,
    pub tip: ContentId,
    pub proof: Vec<u8>,
    pub leaves: Vec<Vec<u8>>,
}

/// A transaction envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    SetData(SetDataPayload),
    SetOwnership(SetOwnershipPayload),
    EstablishToken(EstablishTokenPayload),
    MintToken(MintTokenPayload),
    SendToken(SendTokenPayload),
    ReceiveToken(ReceiveTokenPayload),
}

impl Transaction {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Transaction::SetData(_) => TransactionType::SetData,
            Transaction::SetOwnership(_) => TransactionType::SetOwnership,
            Transaction::EstablishToken(_) => TransactionType::EstablishToken,
            Transaction::MintToken(_) => TransactionType::MintToken,
            Transaction::SendToken(_) => TransactionType::SendToken,
            Transaction::ReceiveToken(_) => TransactionType::ReceiveToken,
        }
    }

    /// The envelope as a node value.
    pub fn to_value(&self) -> Value {
        let payload: Node = match self {
            Transaction::SetData(p) => Node::from([
                ("path".to_owned(), Value::from(p.path.as_str())),
                ("value".to_owned(), p.value.clone()),
            ]),
            Transaction::SetOwnership(p) => Node::from([(
                "authentication".to_owned(),
                Value::from(p.authentication.clone()),
            )]),
            Transaction::EstablishToken(p) => Node::from([
                ("name".to_owned(), Value::from(p.name.as_str())),
                (
                    "monetaryPolicy".to_owned(),
                    Value::Map(Node::from([("maximum".to_owned(), Value::from(p.max_supply))])),
                ),
            ]),
            Transaction::MintToken(p) => Node::from([
                ("name".to_owned(), Value::from(p.name.as_str())),
                ("amount".to_owned(), Value::from(p.amount)),
            ]),
            Transaction::SendToken(p) => Node::from([
                ("id".to_owned(), Value::from(p.id.as_str())),
                ("name".to_owned(), Value::from(p.name.as_str())),
                ("amount".to_owned(), Value::from(p.amount)),
                ("destination".to_owned(), Value::from(p.destination.as_str())),
            ]),
            Transaction::ReceiveToken(p) => Node::from([
                (
                    "sendTokenTransactionId".to_owned(),
                    Value::from(p.send_token_transaction_id.as_str()),
                ),
                ("tip".to_owned(), Value::Bytes(p.tip.as_bytes().to_vec())),
                ("signature".to_owned(), Value::Bytes(p.proof.clone())),
                (
                    "leaves".to_owned(),
                    Value::List(p.leaves.iter().cloned().map(Value::Bytes).collect()),
                ),
            ]),
        };

        Value::Map(Node::from([
            (
                "type".to_owned(),
                Value::from(u32::from(self.transaction_type().to_u8())),
            ),
            ("payload".to_owned(), Value::Map(payload)),
        ]))
    }

    /// Canonical CBOR bytes of the envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(encode_value(&self.to_value())?)
    }

    /// Decode an envelope produced by [`Transaction::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_value(&decode_value(bytes)?)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let type_code = value
            .child("type")
            .and_then(Value::as_integer)
            .and_then(|i| u8::try_from(i).ok())
            .ok_or_else(|| malformed("missing type"))?;
        let kind = TransactionType::from_u8(type_code)
            .ok_or_else(|| malformed(&format!("unknown transaction type {}", type_code)))?;
        let p = value
            .child("payload")
            .and_then(Value::as_map)
            .ok_or_else(|| malformed("missing payload"))?;

        Ok(match kind {
            TransactionType::SetData => Transaction::SetData(SetDataPayload {
                path: text(p, "path")?,
                value: p.get("value").cloned().unwrap_or(Value::Null),
            }),
            TransactionType::SetOwnership => Transaction::SetOwnership(SetOwnershipPayload {
                authentication: p
                    .get("authentication")
                    .and_then(Value::to_string_list)
                    .ok_or_else(|| malformed("authentication must be a list of strings"))?,
            }),
            TransactionType::EstablishToken => {
                Transaction::EstablishToken(EstablishTokenPayload {
                    name: text(p, "name")?,
                    max_supply: p
                        .get("monetaryPolicy")
                        .and_then(|m| m.child("maximum"))
                        .and_then(Value::as_u64)
                        .ok_or_else(|| malformed("missing monetaryPolicy.maximum"))?,
                })
            }
            TransactionType::MintToken => Transaction::MintToken(MintTokenPayload {
                name: text(p, "name")?,
                amount: unsigned(p, "amount")?,
            }),
            TransactionType::SendToken => Transaction::SendToken(SendTokenPayload {
                id: text(p, "id")?,
                name: text(p, "name")?,
                amount: unsigned(p, "amount")?,
                destination: text(p, "destination")?,
            }),
            TransactionType::ReceiveToken => Transaction::ReceiveToken(ReceiveTokenPayload {
                send_token_transaction_id: text(p, "sendTokenTransactionId")?,
                tip: p
                    .get("tip")
                    .and_then(Value::as_bytes)
                    .and_then(|b| ContentId::try_from(b).ok())
                    .ok_or_else(|| malformed("invalid tip"))?,
                proof: p
                    .get("signature")
                    .and_then(Value::as_bytes)
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| malformed("missing signature"))?,
                leaves: p
                    .get("leaves")
                    .and_then(Value::as_list)
                    .map(|items| {
                        items
                            .iter()
                            .map(|v| v.as_bytes().map(<[u8]>::to_vec))
                            .collect::<Option<Vec<_>>>()
                    })
                    .unwrap_or(Some(Vec::new()))
                    .ok_or_else(|| malformed("leaves must be byte strings"))?,
            }),
        })
    }
}

fn malformed(msg: &str) -> CoreError {
    CoreError::DecodingError(format!("transaction: {}", msg))
}

fn text(payload: &Node, key: &str) -> std::result::Result<String, CoreError> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| malformed(&format!("missing {}", key)))
}

fn unsigned(payload: &Node, key: &str) -> std::result::Result<u64, CoreError> {
    payload
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed(&format!("missing {}", key)))
}

/// The name a token is known by outside its issuing tree.
pub fn canonical_token_name(owner: &Did, name: &str) -> String {
    format!("{}:{}", owner, name)
}

pub fn set_data_transaction(path: impl Into<String>, value: impl Into<Value>) -> Transaction {
    Transaction::SetData(SetDataPayload {
        path: path.into(),
        value: value.into(),
    })
}

/// Replace the authentication list. Entries may be addresses, DIDs, or DIDs
/// followed by a path into that tree.
pub fn set_ownership_transaction<I>(authentication: I) -> Transaction
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Transaction::SetOwnership(SetOwnershipPayload {
        authentication: authentication
            .into_iter()
            .map(|a| a.as_ref().to_owned())
            .collect(),
    })
}

pub fn establish_token_transaction(name: impl Into<String>, max_supply: u64) -> Transaction {
    Transaction::EstablishToken(EstablishTokenPayload {
        name: name.into(),
        max_supply,
    })
}

pub fn mint_token_transaction(name: impl Into<String>, amount: u64) -> Transaction {
    Transaction::MintToken(MintTokenPayload {
        name: name.into(),
        amount,
    })
}

pub fn send_token_transaction(
    send_id: impl Into<String>,
    token_name: impl Into<String>,
    amount: u64,
    destination: &Did,
) -> Transaction {
    Transaction::SendToken(SendTokenPayload {
        id: send_id.into(),
        name: token_name.into(),
        amount,
        destination: destination.to_string(),
    })
}

pub fn receive_token_transaction(
    send_id: impl Into<String>,
    tip: ContentId,
    proof: impl Into<Vec<u8>>,
    leaves: Vec<Vec<u8>>,
) -> Transaction {
    Transaction::ReceiveToken(ReceiveTokenPayload {
        send_token_transaction_id: send_id.into(),
        tip,
        proof: proof.into(),
        leaves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaintree_core::{Keypair, DID_LEN};

    #[test]
    fn test_set_data_envelope_shape() {
        let tx = set_data_transaction("/a/b", "x");
        let v = tx.to_value();
        assert_eq!(v.child("type"), Some(&Value::Integer(5)));
        assert_eq!(
            v.child("payload").and_then(|p| p.child("path")),
            Some(&Value::from("/a/b"))
        );
    }

    #[test]
    fn test_envelopes_survive_encoding() {
        let did = Did::from_public_key(&Keypair::from_seed(&[1; 32]).public_key());
        let txs = vec![
            set_data_transaction("hi", Value::Map(Node::from([("n".to_owned(), Value::Null)]))),
            set_ownership_transaction([did.as_str()]),
            establish_token_transaction("coin", 10),
            mint_token_transaction("coin", 5),
            send_token_transaction("send-1", canonical_token_name(&did, "coin"), 5, &did),
            receive_token_transaction(
                "send-1",
                ContentId::from_bytes([9; 32]),
                vec![1, 2, 3],
                vec![vec![4], vec![5, 6]],
            ),
        ];
        for tx in txs {
            let bytes = tx.to_bytes().unwrap();
            assert_eq!(Transaction::from_bytes(&bytes).unwrap(), tx);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let v = Value::Map(Node::from([
            ("type".to_owned(), Value::from(99u32)),
            ("payload".to_owned(), Value::Map(Node::new())),
        ]));
        assert!(Transaction::from_value(&v).is_err());
    }

    #[test]
    fn test_canonical_token_name() {
        let did = Did::from_public_key(&Keypair::from_seed(&[2; 32]).public_key());
        let name = canonical_token_name(&did, "testtoken");
        assert_eq!(name.len(), DID_LEN + ":testtoken".len());
        assert!(name.starts_with(did.as_str()));
    }
}
