//! In-memory stand-in for the four deployed contracts.
//!
//! Decodes write calldata by selector and appends the entry it describes;
//! answers view calls from what it holds. Per-account nonces follow node
//! rules: below the expected value is "nonce too low", above is queued until
//! the gap closes. Calldata with an unknown selector is accepted as a no-op.

use alloy::primitives::{keccak256, Address, Bytes, TxHash, B256};
use alloy::sol_types::{SolCall, SolValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::contracts::abi::{
    ChatEntry, CreditEntry, DisbursementEntry, DocumentEntry, EmiEntry, IAccessControl,
    ICreditRegistry, ILoanRegistry, IPaymentLedger, LoanEntry,
};

/// Seconds value for the first simulated block.
const GENESIS_TIME: u64 = 1_700_000_000;

#[derive(Debug, Default)]
struct LedgerState {
    nonces: HashMap<Address, u64>,
    queued: HashMap<Address, BTreeMap<u64, Vec<u8>>>,
    accepted: Vec<u64>,
    clock: u64,
    loans: Vec<LoanEntry>,
    chats: Vec<ChatEntry>,
    documents: Vec<DocumentEntry>,
    credits: Vec<CreditEntry>,
    disbursements: Vec<DisbursementEntry>,
    emis: Vec<EmiEntry>,
    restricted: bool,
    writers: HashSet<Address>,
}

impl LedgerState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        GENESIS_TIME + self.clock
    }

    fn next_nonce(&self, account: &Address) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    fn accept(&mut self, account: Address, nonce: u64) {
        self.nonces.insert(account, nonce + 1);
        self.accepted.push(nonce);
    }

    fn authorized(&self, account: &Address) -> bool {
        !self.restricted || self.writers.contains(account)
    }
}

/// Shared chain state behind every simulated endpoint.
#[derive(Debug)]
pub struct SimulatedLedger {
    chain_id: u64,
    state: Mutex<LedgerState>,
}

impl SimulatedLedger {
    pub fn new(chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            state: Mutex::new(LedgerState::default()),
        })
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Pretend `account` already has `count` transactions.
    pub fn set_transaction_count(&self, account: Address, count: u64) {
        self.state().nonces.insert(account, count);
    }

    pub fn pending_nonce(&self, account: Address) -> u64 {
        self.state().next_nonce(&account)
    }

    /// Nonces accepted so far, in acceptance order.
    pub fn accepted_nonces(&self) -> Vec<u64> {
        self.state().accepted.clone()
    }

    /// Total entries across all categories.
    pub fn entry_count(&self) -> usize {
        let state = self.state();
        state.loans.len()
            + state.chats.len()
            + state.documents.len()
            + state.credits.len()
            + state.disbursements.len()
            + state.emis.len()
    }

    /// Only `writers` (and accounts granted later) may write from now on.
    pub fn restrict_writers(&self, writers: impl IntoIterator<Item = Address>) {
        let mut state = self.state();
        state.restricted = true;
        state.writers = writers.into_iter().collect();
    }

    /// Accept a signed transaction into the pending pool.
    pub fn submit(&self, from: Address, nonce: u64, data: &[u8]) -> Result<TxHash, String> {
        let mut state = self.state();

        let expected = state.next_nonce(&from);
        if nonce < expected {
            return Err(format!("nonce too low: next nonce {}, tx nonce {}", expected, nonce));
        }
        if selector(data).is_some() && !state.authorized(&from) {
            return Err("execution reverted: caller is not a writer".to_string());
        }

        let mut preimage = Vec::with_capacity(20 + 8 + data.len());
        preimage.extend_from_slice(from.as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(data);
        let hash = keccak256(preimage);

        if nonce > expected {
            // Held until the gap closes.
            state.queued.entry(from).or_default().insert(nonce, data.to_vec());
            return Ok(hash);
        }

        apply(&mut state, data)?;
        state.accept(from, nonce);

        loop {
            let next = state.next_nonce(&from);
            let Some(queued) = state.queued.get_mut(&from).and_then(|q| q.remove(&next)) else {
                break;
            };
            // A queued call that fails still consumes its nonce, like a mined revert.
            if let Err(e) = apply(&mut state, &queued) {
                tracing::debug!(nonce = next, error = %e, "Queued simulated transaction reverted");
            }
            state.accept(from, next);
        }

        Ok(hash)
    }

    /// Answer an `eth_call`.
    pub fn view(&self, data: &[u8]) -> Result<Bytes, String> {
        let state = self.state();
        let Some(sel) = selector(data) else {
            return Ok(Bytes::new());
        };

        let encoded = if sel == ILoanRegistry::getLoansByPhoneCall::SELECTOR {
            let call = decode::<ILoanRegistry::getLoansByPhoneCall>(data)?;
            (by_phone(&state.loans, call.phoneHash, |e| e.phoneHash),).abi_encode_params()
        } else if sel == ILoanRegistry::getChatLogsCall::SELECTOR {
            let call = decode::<ILoanRegistry::getChatLogsCall>(data)?;
            (by_phone(&state.chats, call.phoneHash, |e| e.phoneHash),).abi_encode_params()
        } else if sel == ILoanRegistry::getDocumentsCall::SELECTOR {
            let call = decode::<ILoanRegistry::getDocumentsCall>(data)?;
            (by_phone(&state.documents, call.phoneHash, |e| e.phoneHash),).abi_encode_params()
        } else if sel == ICreditRegistry::getCreditHistoryCall::SELECTOR {
            let call = decode::<ICreditRegistry::getCreditHistoryCall>(data)?;
            (by_phone(&state.credits, call.phoneHash, |e| e.phoneHash),).abi_encode_params()
        } else if sel == IPaymentLedger::getDisbursementsCall::SELECTOR {
            let call = decode::<IPaymentLedger::getDisbursementsCall>(data)?;
            (by_phone(&state.disbursements, call.phoneHash, |e| e.phoneHash),).abi_encode_params()
        } else if sel == IPaymentLedger::getEmisCall::SELECTOR {
            let call = decode::<IPaymentLedger::getEmisCall>(data)?;
            (by_phone(&state.emis, call.phoneHash, |e| e.phoneHash),).abi_encode_params()
        } else if sel == IAccessControl::isAuthorizedCall::SELECTOR {
            let call = decode::<IAccessControl::isAuthorizedCall>(data)?;
            (state.authorized(&call.account),).abi_encode_params()
        } else {
            return Err("execution reverted: unknown view function".to_string());
        };

        Ok(Bytes::from(encoded))
    }
}

fn selector(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4).and_then(|s| s.try_into().ok())
}

fn decode<C: SolCall>(data: &[u8]) -> Result<C, String> {
    C::abi_decode(data).map_err(|e| format!("execution reverted: bad calldata: {}", e))
}

fn by_phone<E: Clone>(entries: &[E], phone: B256, key: impl Fn(&E) -> B256) -> Vec<E> {
    entries.iter().filter(|e| key(e) == phone).cloned().collect()
}

fn apply(state: &mut LedgerState, data: &[u8]) -> Result<(), String> {
    let Some(sel) = selector(data) else {
        return Ok(());
    };

    if sel == ILoanRegistry::logApplicationCall::SELECTOR {
        let c = decode::<ILoanRegistry::logApplicationCall>(data)?;
        let timestamp = state.tick();
        state.loans.push(LoanEntry {
            phoneHash: c.phoneHash,
            applicationHash: c.applicationHash,
            amount: c.amount,
            interestBps: c.interestBps,
            tenureMonths: c.tenureMonths,
            status: c.status,
            timestamp,
        });
    } else if sel == ILoanRegistry::logChatTurnCall::SELECTOR {
        let c = decode::<ILoanRegistry::logChatTurnCall>(data)?;
        let timestamp = state.tick();
        state.chats.push(ChatEntry {
            sessionHash: c.sessionHash,
            phoneHash: c.phoneHash,
            messageHash: c.messageHash,
            responseHash: c.responseHash,
            intent: c.intent,
            timestamp,
        });
    } else if sel == ILoanRegistry::logDocumentCall::SELECTOR {
        let c = decode::<ILoanRegistry::logDocumentCall>(data)?;
        let timestamp = state.tick();
        state.documents.push(DocumentEntry {
            applicationHash: c.applicationHash,
            phoneHash: c.phoneHash,
            documentHash: c.documentHash,
            docType: c.docType,
            verified: c.verified,
            timestamp,
        });
    } else if sel == ICreditRegistry::recordCreditScoreCall::SELECTOR {
        let c = decode::<ICreditRegistry::recordCreditScoreCall>(data)?;
        let timestamp = state.tick();
        state.credits.push(CreditEntry {
            phoneHash: c.phoneHash,
            applicationHash: c.applicationHash,
            score: c.score,
            grade: c.grade,
            timestamp,
        });
    } else if sel == IPaymentLedger::recordDisbursementCall::SELECTOR {
        let c = decode::<IPaymentLedger::recordDisbursementCall>(data)?;
        let timestamp = state.tick();
        state.disbursements.push(DisbursementEntry {
            applicationHash: c.applicationHash,
            phoneHash: c.phoneHash,
            amount: c.amount,
            referenceHash: c.referenceHash,
            timestamp,
        });
    } else if sel == IPaymentLedger::recordEmiPaymentCall::SELECTOR {
        let c = decode::<IPaymentLedger::recordEmiPaymentCall>(data)?;
        let timestamp = state.tick();
        state.emis.push(EmiEntry {
            applicationHash: c.applicationHash,
            phoneHash: c.phoneHash,
            installment: c.installment,
            amount: c.amount,
            dueDate: c.dueDate,
            status: c.status,
            timestamp,
        });
    } else if sel == IAccessControl::grantWriterCall::SELECTOR {
        let c = decode::<IAccessControl::grantWriterCall>(data)?;
        state.writers.insert(c.account);
    } else if sel == IAccessControl::revokeWriterCall::SELECTOR {
        let c = decode::<IAccessControl::revokeWriterCall>(data)?;
        state.writers.remove(&c.account);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_rules() {
        let ledger = SimulatedLedger::new(31337);
        let from = Address::repeat_byte(1);
        ledger.set_transaction_count(from, 3);

        assert!(ledger.submit(from, 2, &[]).unwrap_err().contains("nonce too low"));
        ledger.submit(from, 4, &[]).unwrap();
        assert_eq!(ledger.pending_nonce(from), 3);
        assert!(ledger.accepted_nonces().is_empty());

        ledger.submit(from, 3, &[]).unwrap();
        assert_eq!(ledger.pending_nonce(from), 5);
        assert_eq!(ledger.accepted_nonces(), vec![3, 4]);
    }

    #[test]
    fn test_write_then_view() {
        let ledger = SimulatedLedger::new(31337);
        let phone = B256::repeat_byte(7);
        let write = ICreditRegistry::recordCreditScoreCall {
            phoneHash: phone,
            applicationHash: B256::repeat_byte(8),
            score: 700,
            grade: 2,
        }
        .abi_encode();
        ledger.submit(Address::ZERO, 0, &write).unwrap();

        let query = ICreditRegistry::getCreditHistoryCall { phoneHash: phone }.abi_encode();
        let bytes = ledger.view(&query).unwrap();
        let entries = ICreditRegistry::getCreditHistoryCall::abi_decode_returns(&bytes).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 700);
        assert!(entries[0].timestamp > GENESIS_TIME);
        assert_eq!(ledger.entry_count(), 1);
    }
}
