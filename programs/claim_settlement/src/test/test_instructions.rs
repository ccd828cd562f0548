use anchor_lang::prelude::AnchorDeserialize;
use anchor_lang::solana_program::system_program;

use crate::constants::*;
use crate::error::CodecError;
use crate::instructions::*;
use crate::test::mocks::key;

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> anchor_lang::prelude::Pubkey {
        crate::ID
    }

    #[test]
    fn test_create_contract_payload_and_accounts() {
        let args = CreateContractArgs {
            total_amount: 900,
            tranche_count: 2,
            recipients: vec![key(10), key(11)],
        };
        let ix = create_contract(
            &program(),
            &CreateContractAccounts {
                contract: key(200),
                owner: key(1),
            },
            &args,
        )
        .unwrap();

        assert_eq!(ix.program_id, program());
        assert_eq!(&ix.data[..8], &CREATE_CONTRACT_DISCRIMINATOR);
        assert_eq!(ix.data.len(), 8 + 8 + 8 + 4 + 64);
        assert_eq!(u64::from_le_bytes(ix.data[8..16].try_into().unwrap()), 900);
        assert_eq!(u64::from_le_bytes(ix.data[16..24].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(ix.data[24..28].try_into().unwrap()), 2);
        assert_eq!(&ix.data[28..60], key(10).as_ref());
        assert_eq!(&ix.data[60..92], key(11).as_ref());
        assert_eq!(CreateContractArgs::try_from_slice(&ix.data[8..]).unwrap(), args);

        let metas: Vec<_> = ix
            .accounts
            .iter()
            .map(|m| (m.pubkey, m.is_signer, m.is_writable))
            .collect();
        assert_eq!(
            metas,
            vec![
                (key(200), true, true),
                (key(1), true, true),
                (system_program::ID, false, false),
            ]
        );
    }

    #[test]
    fn test_create_contract_rejects_mismatched_recipients() {
        let args = CreateContractArgs {
            total_amount: 900,
            tranche_count: 3,
            recipients: vec![key(10), key(11)],
        };
        let err = create_contract(
            &program(),
            &CreateContractAccounts {
                contract: key(200),
                owner: key(1),
            },
            &args,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CodecError::RecipientCountMismatch {
                recipients: 2,
                tranche_count: 3
            }
        );
    }

    #[test]
    fn test_create_contract_rejects_program_limits() {
        let zero_amount = CreateContractArgs {
            total_amount: 0,
            tranche_count: 1,
            recipients: vec![key(10)],
        };
        assert_eq!(zero_amount.encode(), Err(CodecError::InvalidAmount));

        let no_tranches = CreateContractArgs {
            total_amount: 10,
            tranche_count: 0,
            recipients: vec![],
        };
        assert_eq!(no_tranches.encode(), Err(CodecError::InvalidTrancheCount));

        let too_many = CreateContractArgs {
            total_amount: 10,
            tranche_count: 11,
            recipients: (0..11).map(key).collect(),
        };
        assert_eq!(
            too_many.encode(),
            Err(CodecError::TooManyRecipients { count: 11, max: MAX_RECIPIENTS })
        );
    }

    #[test]
    fn test_distribute_tranche_instruction() {
        let ix = distribute_tranche(
            &program(),
            &DistributeTrancheAccounts {
                contract: key(200),
                recipient: key(10),
                owner: key(250),
            },
        );

        assert_eq!(ix.data, DISTRIBUTE_TRANCHE_DISCRIMINATOR.to_vec());
        let metas: Vec<_> = ix
            .accounts
            .iter()
            .map(|m| (m.pubkey, m.is_signer, m.is_writable))
            .collect();
        assert_eq!(
            metas,
            vec![
                (key(200), false, true),
                (key(10), false, true),
                (key(250), true, false),
            ]
        );
    }

    #[test]
    fn test_close_contract_instruction() {
        let ix = close_contract(
            &program(),
            &CloseContractAccounts {
                contract: key(200),
                owner: key(1),
            },
        );

        assert_eq!(ix.data, CLOSE_CONTRACT_DISCRIMINATOR.to_vec());
        let metas: Vec<_> = ix
            .accounts
            .iter()
            .map(|m| (m.pubkey, m.is_signer, m.is_writable))
            .collect();
        assert_eq!(metas, vec![(key(200), false, true), (key(1), true, true)]);
    }
}
