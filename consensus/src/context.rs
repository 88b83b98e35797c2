use crate::error::ProtocolError;
use crate::messages::ConsensusMessage;
use dbft_traits::Signature;
use dbft_types::{Hash256, Height, Seat, ViewNumber};
use std::collections::HashSet;

/// Which role the local replica plays for the current `(height, view)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Backup,
}

/// The authoritative state of the local replica for one block height.
///
/// Reset on every height advance; per-view fields (selected hashes,
/// signatures, the accepted prepare request) are also reset on every view
/// change, but the height itself is retained across a view change.
pub struct ConsensusContext {
    pub height: Height,
    pub view: ViewNumber,
    pub n: u16,
    pub local_seat: Seat,
    nonce: u32,
    timestamp_ms: u64,
    selected_tx_hashes: Vec<Hash256>,
    prepare_request: Option<ConsensusMessage>,
    /// Signatures indexed by seat; `None` until that seat has contributed.
    signatures: Vec<Option<Signature>>,
    /// Seats that have already announced a change-view to the view stored
    /// alongside them, so repeats and stale announcements do not double
    /// count towards quorum.
    view_change_votes: Vec<Option<ViewNumber>>,
    /// Seats already known to have equivocated at the current `(height,
    /// view)` — logged once, then ignored.
    equivocators: HashSet<Seat>,
}

impl ConsensusContext {
    pub fn new(height: Height, n: u16, local_seat: Seat) -> Self {
        ConsensusContext {
            height,
            view: 0,
            n,
            local_seat,
            nonce: 0,
            timestamp_ms: 0,
            selected_tx_hashes: Vec::new(),
            prepare_request: None,
            signatures: vec![None; n as usize],
            view_change_votes: vec![None; n as usize],
            equivocators: HashSet::new(),
        }
    }

    /// `f` in `N = 3f + 1`.
    pub fn f(&self) -> u16 {
        (self.n - 1) / 3
    }

    /// `2f + 1`, the quorum size.
    pub fn quorum(&self) -> u16 {
        2 * self.f() + 1
    }

    /// The seat index of the primary for the current `(height, view)`.
    pub fn primary_seat(&self) -> Seat {
        ((self.height.wrapping_sub(self.view as u64)) % self.n as u64) as Seat
    }

    pub fn role(&self) -> Role {
        if self.local_seat == self.primary_seat() {
            Role::Primary
        } else {
            Role::Backup
        }
    }

    pub fn selected_tx_hashes(&self) -> &[Hash256] {
        &self.selected_tx_hashes
    }

    pub fn prepare_request(&self) -> Option<&ConsensusMessage> {
        self.prepare_request.as_ref()
    }

    /// Records this replica's own proposal (primary path).
    pub fn set_local_proposal(&mut self, nonce: u32, timestamp_ms: u64, tx_hashes: Vec<Hash256>) {
        self.nonce = nonce;
        self.timestamp_ms = timestamp_ms;
        self.selected_tx_hashes = tx_hashes;
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    /// Accepts a `PrepareRequest` from the primary, enforcing "at most one
    /// accepted per (H, v)".
    pub fn accept_prepare_request(
        &mut self,
        msg: ConsensusMessage,
    ) -> Result<(), ProtocolError> {
        if self.prepare_request.is_some() {
            return Err(ProtocolError::DuplicatePrepareRequest {
                height: self.height,
                view: self.view as u8,
            });
        }
        if let ConsensusMessage::PrepareRequest {
            nonce,
            timestamp_ms,
            ref tx_hashes,
            ..
        } = msg
        {
            self.nonce = nonce;
            self.timestamp_ms = timestamp_ms;
            self.selected_tx_hashes = tx_hashes.clone();
        }
        self.prepare_request = Some(msg);
        Ok(())
    }

    /// Records a signature for `seat`. A second, *different* signature from
    /// a seat that already contributed is equivocation: logged once via the
    /// `Err` return, ignored for quorum counting (the first signature is
    /// retained, safety preserved).
    pub fn record_signature(
        &mut self,
        seat: Seat,
        signature: Signature,
    ) -> Result<(), ProtocolError> {
        let slot = self
            .signatures
            .get_mut(seat as usize)
            .expect("seat index is bounds-checked by the caller against `n`");
        match slot {
            None => {
                *slot = Some(signature);
                Ok(())
            }
            Some(existing) if *existing == signature => Ok(()),
            Some(_) => {
                self.equivocators.insert(seat);
                Err(ProtocolError::Equivocation {
                    seat,
                    height: self.height,
                    view: self.view as u8,
                })
            }
        }
    }

    /// Number of distinct seats that have contributed a signature.
    pub fn signature_count(&self) -> u16 {
        self.signatures.iter().filter(|s| s.is_some()).count() as u16
    }

    /// `true` once quorum (`2f+1`) matching signatures have been collected.
    pub fn has_quorum(&self) -> bool {
        self.signature_count() >= self.quorum()
    }

    pub fn signatures(&self) -> Vec<(Seat, Signature)> {
        self.signatures
            .iter()
            .enumerate()
            .filter_map(|(seat, sig)| sig.clone().map(|s| (seat as Seat, s)))
            .collect()
    }

    /// Records that `seat` announced a change-view to `new_view`. Returns
    /// the number of distinct seats now announced at `new_view` or higher
    /// (matching "peers that changed view at v' > v").
    pub fn record_view_change_vote(&mut self, seat: Seat, new_view: ViewNumber) -> u16 {
        if let Some(slot) = self.view_change_votes.get_mut(seat as usize) {
            *slot = Some(new_view);
        }
        self.view_change_votes
            .iter()
            .filter(|v| matches!(v, Some(v) if *v >= new_view))
            .count() as u16
    }

    /// Advances to a new view, resetting per-view fields but retaining
    /// height.
    pub fn advance_view(&mut self, new_view: ViewNumber) {
        self.view = new_view;
        self.selected_tx_hashes.clear();
        self.prepare_request = None;
        self.signatures = vec![None; self.n as usize];
        self.equivocators.clear();
        // View-change votes persist across the bump: a peer who already
        // voted for `new_view` or higher should still count when the next
        // bump happens.
    }

    /// Advances to the next height, resetting everything including view
    /// change votes.
    pub fn advance_height(&mut self, new_height: Height) {
        self.height = new_height;
        self.view = 0;
        self.selected_tx_hashes.clear();
        self.prepare_request = None;
        self.signatures = vec![None; self.n as usize];
        self.view_change_votes = vec![None; self.n as usize];
        self.equivocators.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_seat_rotates_with_height_and_view() {
        let ctx = ConsensusContext::new(10, 4, 0);
        assert_eq!(ctx.primary_seat(), 10 % 4);
    }

    #[test]
    fn quorum_matches_3f_plus_1() {
        let ctx = ConsensusContext::new(0, 4, 0);
        assert_eq!(ctx.f(), 1);
        assert_eq!(ctx.quorum(), 3);
    }

    #[test]
    fn second_distinct_signature_is_equivocation_and_first_is_kept() {
        let mut ctx = ConsensusContext::new(10, 4, 0);
        ctx.record_signature(1, Signature(vec![1])).unwrap();
        let err = ctx.record_signature(1, Signature(vec![2])).unwrap_err();
        assert!(matches!(err, ProtocolError::Equivocation { seat: 1, .. }));
        assert_eq!(ctx.signatures(), vec![(1, Signature(vec![1]))]);
    }

    #[test]
    fn repeated_identical_signature_is_not_equivocation() {
        let mut ctx = ConsensusContext::new(10, 4, 0);
        ctx.record_signature(1, Signature(vec![1])).unwrap();
        ctx.record_signature(1, Signature(vec![1])).unwrap();
    }

    #[test]
    fn advance_view_retains_height_resets_signatures() {
        let mut ctx = ConsensusContext::new(10, 4, 0);
        ctx.record_signature(0, Signature(vec![9])).unwrap();
        ctx.advance_view(1);
        assert_eq!(ctx.height, 10);
        assert_eq!(ctx.view, 1);
        assert_eq!(ctx.signature_count(), 0);
    }
}
