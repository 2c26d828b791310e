use alloy_primitives::{Address, B256, U256, address};
use exodus_proofs::{AccountAssociation, AccountProofVerifier, AccountTree, ProofError};

fn four_leaves() -> Vec<AccountAssociation> {
    vec![
        AccountAssociation::new(U256::from(0xa1u64), address!("1000000000000000000000000000000000000001")),
        AccountAssociation::new(U256::from(0xa2u64), address!("2000000000000000000000000000000000000002")),
        AccountAssociation::new(U256::from(0xa3u64), address!("3000000000000000000000000000000000000003")),
        AccountAssociation::new(U256::from(0xa4u64), address!("4000000000000000000000000000000000000004")),
    ]
}

#[test]
fn four_leaf_tree_proofs_verify() {
    let leaves = four_leaves();
    let tree = AccountTree::new(&leaves).unwrap();

    for assoc in &leaves {
        let proof = tree.proof_for(assoc.owner_key, assoc.external_address).unwrap();
        assert_eq!(proof.len(), 2);
        AccountProofVerifier
            .verify(assoc.owner_key, assoc.external_address, tree.root(), &proof)
            .unwrap();
    }
}

#[test]
fn sibling_order_is_irrelevant() {
    let leaves = four_leaves();
    let tree = AccountTree::new(&leaves).unwrap();
    let proof = tree.proof(1).unwrap();

    // Commutative nodes: the same siblings reproduce the root whichever side they sit on.
    let folded = AccountProofVerifier::process_proof(leaves[1].leaf(), &proof);
    assert_eq!(folded, tree.root());
    let reversed_pair = AccountProofVerifier::process_proof(leaves[0].leaf(), &[leaves[1].leaf(), proof[1]]);
    assert_eq!(reversed_pair, tree.root());
}

#[test]
fn mismatched_owner_fails() {
    let leaves = four_leaves();
    let tree = AccountTree::new(&leaves).unwrap();
    let proof = tree.proof(0).unwrap();

    let result = AccountProofVerifier.verify(
        leaves[1].owner_key,
        leaves[0].external_address,
        tree.root(),
        &proof,
    );
    assert_eq!(
        result,
        Err(ProofError::InvalidAccountProof {
            owner_key: leaves[1].owner_key,
            address: leaves[0].external_address,
        })
    );
}

#[test]
fn wrong_root_fails() {
    let leaves = four_leaves();
    let tree = AccountTree::new(&leaves).unwrap();
    let proof = tree.proof(3).unwrap();

    assert!(
        AccountProofVerifier
            .verify(leaves[3].owner_key, leaves[3].external_address, B256::repeat_byte(7), &proof)
            .is_err()
    );
    assert!(
        AccountProofVerifier
            .verify(leaves[3].owner_key, Address::ZERO, tree.root(), &proof)
            .is_err()
    );
}
