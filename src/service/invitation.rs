//! Invitation service: the cleaner-client invitation lifecycle
//!
//! Owns the relationship state machine. Email delivery stays with the
//! caller (the router sends best-effort after a successful mutation) so
//! the transitions here are pure storage logic.

use crate::crypto::PasswordHasher;
use crate::domain::{
    split_invited_name, AcceptInvitationInput, AccountType, AddressInput, ClientRelationship,
    CreateHomeInput, CreateInvitationInput, CreateUserInput, Home, InviteDisposition,
    RelationshipStatus, StringUuid, User, ValidatedInvite, INVITE_TOKEN_LEN,
};
use crate::error::{AppError, Result};
use crate::repository::relationship::InvitationSnapshot;
use crate::repository::{
    BillingRepository, ClientRelationshipRepository, HomeRepository, ScheduleRepository,
    UserRepository,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use validator::Validate;

/// Bounded retries for token generation; with 62^32 possible tokens this
/// is never exhausted in practice
const TOKEN_GENERATION_ATTEMPTS: usize = 10;

/// Everything created by a successful acceptance
#[derive(Debug)]
pub struct AcceptedInvitation {
    pub user: User,
    pub home: Option<Home>,
    pub relationship: ClientRelationship,
}

/// What `remove` did, by starting status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// A pending invitation was withdrawn
    InvitationCancelled,
    /// An active relationship was deactivated; carries the number of
    /// future appointments cancelled by the cascade
    RelationshipDeactivated { cancelled_appointments: u64 },
}

/// Service for managing cleaner-client invitations
pub struct InvitationService<RR, UR, HR, BR, SR>
where
    RR: ClientRelationshipRepository,
    UR: UserRepository,
    HR: HomeRepository,
    BR: BillingRepository,
    SR: ScheduleRepository,
{
    relationship_repo: Arc<RR>,
    user_repo: Arc<UR>,
    home_repo: Arc<HR>,
    billing_repo: Arc<BR>,
    schedule_repo: Arc<SR>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<RR, UR, HR, BR, SR> InvitationService<RR, UR, HR, BR, SR>
where
    RR: ClientRelationshipRepository,
    UR: UserRepository,
    HR: HomeRepository,
    BR: BillingRepository,
    SR: ScheduleRepository,
{
    pub fn new(
        relationship_repo: Arc<RR>,
        user_repo: Arc<UR>,
        home_repo: Arc<HR>,
        billing_repo: Arc<BR>,
        schedule_repo: Arc<SR>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            relationship_repo,
            user_repo,
            home_repo,
            billing_repo,
            schedule_repo,
            hasher,
        }
    }

    /// Generate a unique 32-character invite token
    pub async fn generate_invite_token(&self) -> Result<String> {
        for _ in 0..TOKEN_GENERATION_ATTEMPTS {
            let token: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(INVITE_TOKEN_LEN)
                .map(char::from)
                .collect();

            if !self.relationship_repo.token_exists(&token).await? {
                return Ok(token);
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "Failed to generate a unique invite token"
        )))
    }

    /// Look up an invite token and classify how it may be used.
    ///
    /// Tokens of the wrong length are rejected without touching storage.
    pub async fn validate_token(&self, token: &str) -> Result<Option<ValidatedInvite>> {
        if token.len() != INVITE_TOKEN_LEN {
            return Ok(None);
        }

        let Some(invite) = self.relationship_repo.find_by_token(token).await? else {
            return Ok(None);
        };

        let disposition = InviteDisposition::from(invite.status);
        Ok(Some(ValidatedInvite {
            invite,
            disposition,
        }))
    }

    /// Create a new invitation for a cleaner
    pub async fn create(
        &self,
        cleaner_id: StringUuid,
        input: CreateInvitationInput,
    ) -> Result<ClientRelationship> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();

        // One pending-or-active row per (cleaner, email)
        if let Some(existing) = self
            .relationship_repo
            .find_pending_or_active(cleaner_id, &email)
            .await?
        {
            return Err(match existing.status {
                RelationshipStatus::Active => AppError::AlreadyLinked,
                _ => AppError::DuplicateInvitation,
            });
        }

        let token = self.generate_invite_token().await?;

        let snapshot = InvitationSnapshot {
            token,
            email,
            name: input.name.trim().to_string(),
            phone: input.phone,
            address: input.address.as_ref().and_then(AddressInput::to_stored),
            beds: input.beds,
            baths: input.baths,
            notes: input.notes,
        };

        self.relationship_repo.create(cleaner_id, &snapshot).await
    }

    /// Accept an invitation: create the homeowner account, the billing
    /// row, and (when an address is known) the home, then link the
    /// relationship unless the invite was cancelled.
    pub async fn accept(
        &self,
        token: &str,
        input: AcceptInvitationInput,
    ) -> Result<AcceptedInvitation> {
        input.validate()?;

        let validated = self
            .validate_token(token)
            .await?
            .ok_or(AppError::InvalidToken)?;

        match validated.disposition {
            InviteDisposition::AlreadyAccepted => return Err(AppError::AlreadyAccepted),
            InviteDisposition::Declined => return Err(AppError::InviteDeclined),
            InviteDisposition::Redeemable | InviteDisposition::Cancelled => {}
        }

        let invite = &validated.invite;

        if self
            .user_repo
            .find_by_email_and_type(&invite.invited_email, AccountType::Homeowner)
            .await?
            .is_some()
        {
            return Err(AppError::AccountExists);
        }

        let (first_name, last_name) = split_invited_name(&invite.invited_name);
        let password_hash = self.hasher.hash(&input.password)?;

        let user = self
            .user_repo
            .create(&CreateUserInput {
                email: invite.invited_email.clone(),
                account_type: AccountType::Homeowner,
                first_name,
                last_name,
                phone: input.phone.clone().or_else(|| invite.invited_phone.clone()),
                password_hash,
            })
            .await?;

        self.billing_repo.create_zero_balance(user.id).await?;

        // Snapshot address + client corrections; corrections win per field
        let base = invite
            .invited_address
            .as_deref()
            .map(AddressInput::from_stored)
            .unwrap_or_default();
        let merged = base.merged_with(input.address_corrections.as_ref());

        let home = if merged.is_usable() {
            Some(
                self.home_repo
                    .create(&CreateHomeInput {
                        owner_id: user.id,
                        address_line1: merged.line1.clone().unwrap_or_default(),
                        address_line2: merged.line2.clone(),
                        city: merged.city.clone(),
                        state: merged.state.clone(),
                        postal_code: merged.postal_code.clone(),
                        beds: invite.invited_beds.unwrap_or(1),
                        baths: invite.invited_baths.unwrap_or(1),
                        is_setup_complete: false,
                    })
                    .await?,
            )
        } else {
            None
        };

        if validated.is_cancelled() {
            // The cleaner withdrew this invite: the token still creates the
            // account, but the relationship is not re-established and the
            // home keeps no preferred cleaner.
            self.relationship_repo.accept_unlinked(invite.id).await?;
        } else {
            let updated = self
                .relationship_repo
                .accept_linked(invite.id, user.id, home.as_ref().map(|h| h.id))
                .await?;
            if updated == 0 {
                // Lost a concurrent accept; the guarded UPDATE did not match
                return Err(AppError::AlreadyAccepted);
            }

            if let Some(home) = &home {
                self.home_repo
                    .set_preferred_cleaner(home.id, invite.cleaner_id)
                    .await?;
            }
        }

        let relationship = self
            .relationship_repo
            .find_by_id(invite.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Relationship {} not found", invite.id)))?;

        Ok(AcceptedInvitation {
            user,
            home,
            relationship,
        })
    }

    /// Decline a pending invitation
    pub async fn decline(&self, token: &str) -> Result<()> {
        let updated = self.relationship_repo.decline(token).await?;
        if updated == 0 {
            return Err(AppError::NotFound(
                "Invitation not found or already processed".to_string(),
            ));
        }
        Ok(())
    }

    /// Stamp the reminder timestamp on a cleaner's pending invitation.
    /// The router re-sends the invite email after this succeeds.
    pub async fn resend(
        &self,
        id: StringUuid,
        cleaner_id: StringUuid,
    ) -> Result<ClientRelationship> {
        let updated = self.relationship_repo.touch_reminder(id, cleaner_id).await?;
        if updated == 0 {
            return Err(AppError::NotFound(
                "Invitation not found or already processed".to_string(),
            ));
        }

        self.relationship_repo
            .find_owned(id, cleaner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Relationship {} not found", id)))
    }

    /// List a cleaner's relationships, optionally filtered by status
    pub async fn list_for_cleaner(
        &self,
        cleaner_id: StringUuid,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<ClientRelationship>> {
        self.relationship_repo
            .list_by_cleaner(cleaner_id, status)
            .await
    }

    /// Withdraw a pending invitation, or deactivate an active
    /// relationship with its schedule/appointment cascade
    pub async fn remove(&self, id: StringUuid, cleaner_id: StringUuid) -> Result<RemoveOutcome> {
        let relationship = self
            .relationship_repo
            .find_owned(id, cleaner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client relationship not found".to_string()))?;

        match relationship.status {
            RelationshipStatus::PendingInvite => {
                self.relationship_repo
                    .update_status(id, RelationshipStatus::Cancelled)
                    .await?;
                Ok(RemoveOutcome::InvitationCancelled)
            }
            RelationshipStatus::Active => {
                self.relationship_repo
                    .update_status(id, RelationshipStatus::Inactive)
                    .await?;

                let schedules = self.schedule_repo.deactivate_for_relationship(id).await?;
                let cancelled = self.schedule_repo.delete_future_appointments(id).await?;
                tracing::info!(
                    "Deactivated relationship {}: {} schedules, {} future appointments",
                    id,
                    schedules,
                    cancelled.count
                );

                if cancelled.price_sum_cents > 0 {
                    if let Some(client_id) = relationship.client_id {
                        self.billing_repo
                            .adjust_balance(client_id, -cancelled.price_sum_cents)
                            .await?;
                    }
                }

                Ok(RemoveOutcome::RelationshipDeactivated {
                    cancelled_appointments: cancelled.count,
                })
            }
            _ => Err(AppError::BadRequest(
                "Relationship already ended".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MockPasswordHasher;
    use crate::repository::billing::MockBillingRepository;
    use crate::repository::home::MockHomeRepository;
    use crate::repository::relationship::MockClientRelationshipRepository;
    use crate::repository::schedule::{CancelledAppointments, MockScheduleRepository};
    use crate::repository::user::MockUserRepository;
    use mockall::predicate::*;

    type TestService = InvitationService<
        MockClientRelationshipRepository,
        MockUserRepository,
        MockHomeRepository,
        MockBillingRepository,
        MockScheduleRepository,
    >;

    fn build_service(
        relationship_repo: MockClientRelationshipRepository,
        user_repo: MockUserRepository,
        home_repo: MockHomeRepository,
        billing_repo: MockBillingRepository,
        schedule_repo: MockScheduleRepository,
    ) -> TestService {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Ok("$argon2id$test-hash".to_string()));

        InvitationService::new(
            Arc::new(relationship_repo),
            Arc::new(user_repo),
            Arc::new(home_repo),
            Arc::new(billing_repo),
            Arc::new(schedule_repo),
            Arc::new(hasher),
        )
    }

    fn default_service() -> TestService {
        build_service(
            MockClientRelationshipRepository::new(),
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        )
    }

    fn valid_token() -> String {
        "a".repeat(INVITE_TOKEN_LEN)
    }

    fn pending_invite(token: &str) -> ClientRelationship {
        ClientRelationship {
            invite_token: token.to_string(),
            invited_email: "client@example.com".to_string(),
            invited_name: "Jane Doe".to_string(),
            status: RelationshipStatus::PendingInvite,
            ..Default::default()
        }
    }

    fn accept_input() -> AcceptInvitationInput {
        AcceptInvitationInput {
            password: "a-long-enough-password".to_string(),
            phone: None,
            address_corrections: None,
        }
    }

    // ------------------------------------------------------------------
    // Token generation & validation
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_token_is_32_alphanumeric() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_token_exists()
            .returning(|_| Ok(false));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let token = service.generate_invite_token().await.unwrap();
        assert_eq!(token.len(), INVITE_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_generate_token_bounded_retries() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_token_exists()
            .times(10)
            .returning(|_| Ok(true));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service.generate_invite_token().await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_validate_wrong_length_skips_lookup() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo.expect_find_by_token().times(0);

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        assert!(service.validate_token("too-short").await.unwrap().is_none());
        assert!(service
            .validate_token(&"a".repeat(33))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_by_token()
            .returning(|_| Ok(None));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        assert!(service
            .validate_token(&valid_token())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_validate_dispositions_by_status() {
        for (status, expected) in [
            (
                RelationshipStatus::PendingInvite,
                InviteDisposition::Redeemable,
            ),
            (RelationshipStatus::Cancelled, InviteDisposition::Cancelled),
            (
                RelationshipStatus::Active,
                InviteDisposition::AlreadyAccepted,
            ),
            (
                RelationshipStatus::Inactive,
                InviteDisposition::AlreadyAccepted,
            ),
            (RelationshipStatus::Declined, InviteDisposition::Declined),
        ] {
            let mut relationship_repo = MockClientRelationshipRepository::new();
            relationship_repo.expect_find_by_token().returning(move |t| {
                Ok(Some(ClientRelationship {
                    invite_token: t.to_string(),
                    status,
                    ..Default::default()
                }))
            });

            let service = build_service(
                relationship_repo,
                MockUserRepository::new(),
                MockHomeRepository::new(),
                MockBillingRepository::new(),
                MockScheduleRepository::new(),
            );

            let validated = service
                .validate_token(&valid_token())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(validated.disposition, expected, "status {:?}", status);
        }
    }

    // ------------------------------------------------------------------
    // create
    // ------------------------------------------------------------------

    fn create_input(email: &str) -> CreateInvitationInput {
        CreateInvitationInput {
            email: email.to_string(),
            name: "Jane Doe".to_string(),
            phone: Some("555-0100".to_string()),
            address: Some(AddressInput {
                line1: Some("12 Elm St".to_string()),
                city: Some("Springfield".to_string()),
                ..Default::default()
            }),
            beds: Some(3),
            baths: Some(2),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_email() {
        let cleaner_id = StringUuid::new_v4();
        let mut relationship_repo = MockClientRelationshipRepository::new();

        relationship_repo
            .expect_find_pending_or_active()
            .withf(|_, email| email == "client@example.com")
            .returning(|_, _| Ok(None));
        relationship_repo
            .expect_token_exists()
            .returning(|_| Ok(false));
        relationship_repo
            .expect_create()
            .withf(|_, snapshot| {
                snapshot.email == "client@example.com"
                    && snapshot.token.len() == INVITE_TOKEN_LEN
                    && snapshot.address.is_some()
            })
            .returning(|cleaner_id, snapshot| {
                Ok(ClientRelationship {
                    cleaner_id,
                    invite_token: snapshot.token.clone(),
                    invited_email: snapshot.email.clone(),
                    ..Default::default()
                })
            });

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let created = service
            .create(cleaner_id, create_input("  Client@Example.COM "))
            .await
            .unwrap();
        assert_eq!(created.invited_email, "client@example.com");
    }

    #[tokio::test]
    async fn test_create_duplicate_pending_fails() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_pending_or_active()
            .returning(|_, _| {
                Ok(Some(ClientRelationship {
                    status: RelationshipStatus::PendingInvite,
                    ..Default::default()
                }))
            });

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service
            .create(StringUuid::new_v4(), create_input("client@example.com"))
            .await;
        assert!(matches!(result, Err(AppError::DuplicateInvitation)));
    }

    #[tokio::test]
    async fn test_create_already_linked_fails() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_pending_or_active()
            .returning(|_, _| {
                Ok(Some(ClientRelationship {
                    status: RelationshipStatus::Active,
                    ..Default::default()
                }))
            });

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service
            .create(StringUuid::new_v4(), create_input("client@example.com"))
            .await;
        assert!(matches!(result, Err(AppError::AlreadyLinked)));
    }

    #[tokio::test]
    async fn test_create_invalid_email_fails_validation() {
        let service = default_service();

        let result = service
            .create(StringUuid::new_v4(), create_input("not-an-email"))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    // ------------------------------------------------------------------
    // accept
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_accept_links_relationship_and_home() {
        let token = valid_token();
        let cleaner_id = StringUuid::new_v4();
        let invite_id = StringUuid::new_v4();

        let mut invite = pending_invite(&token);
        invite.id = invite_id;
        invite.cleaner_id = cleaner_id;
        invite.invited_address = AddressInput {
            line1: Some("12 Elm St".to_string()),
            ..Default::default()
        }
        .to_stored();
        invite.invited_beds = Some(3);

        let mut relationship_repo = MockClientRelationshipRepository::new();
        {
            let invite = invite.clone();
            relationship_repo
                .expect_find_by_token()
                .returning(move |_| Ok(Some(invite.clone())));
        }
        relationship_repo
            .expect_accept_linked()
            .withf(move |id, _, home_id| *id == invite_id && home_id.is_some())
            .times(1)
            .returning(|_, _, _| Ok(1));
        relationship_repo
            .expect_accept_unlinked()
            .times(0);
        relationship_repo.expect_find_by_id().returning(move |id| {
            Ok(Some(ClientRelationship {
                id,
                status: RelationshipStatus::Active,
                cleaner_id,
                ..Default::default()
            }))
        });

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email_and_type()
            .with(eq("client@example.com"), eq(AccountType::Homeowner))
            .returning(|_, _| Ok(None));
        user_repo.expect_create().returning(|input| {
            Ok(User {
                email: input.email.clone(),
                account_type: input.account_type,
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                password_hash: input.password_hash.clone(),
                ..Default::default()
            })
        });

        let mut home_repo = MockHomeRepository::new();
        home_repo
            .expect_create()
            .withf(|input| {
                input.address_line1 == "12 Elm St"
                    && input.beds == 3
                    && input.baths == 1
                    && !input.is_setup_complete
            })
            .returning(|input| {
                Ok(Home {
                    owner_id: input.owner_id,
                    address_line1: input.address_line1.clone(),
                    beds: input.beds,
                    baths: input.baths,
                    ..Default::default()
                })
            });
        home_repo
            .expect_set_preferred_cleaner()
            .withf(move |_, cleaner| *cleaner == cleaner_id)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_create_zero_balance()
            .times(1)
            .returning(|_| Ok(()));

        let service = build_service(
            relationship_repo,
            user_repo,
            home_repo,
            billing_repo,
            MockScheduleRepository::new(),
        );

        let accepted = service.accept(&token, accept_input()).await.unwrap();
        assert_eq!(accepted.user.first_name, "Jane");
        assert_eq!(accepted.user.last_name, "Doe");
        assert_eq!(accepted.user.account_type, AccountType::Homeowner);
        assert!(accepted.home.is_some());
        assert_eq!(accepted.relationship.status, RelationshipStatus::Active);
    }

    #[tokio::test]
    async fn test_accept_cancelled_invite_stays_unlinked() {
        let token = valid_token();
        let invite_id = StringUuid::new_v4();

        let mut invite = pending_invite(&token);
        invite.id = invite_id;
        invite.status = RelationshipStatus::Cancelled;
        invite.invited_address = AddressInput {
            line1: Some("12 Elm St".to_string()),
            ..Default::default()
        }
        .to_stored();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        {
            let invite = invite.clone();
            relationship_repo
                .expect_find_by_token()
                .returning(move |_| Ok(Some(invite.clone())));
        }
        relationship_repo
            .expect_accept_unlinked()
            .with(eq(invite_id))
            .times(1)
            .returning(|_| Ok(()));
        relationship_repo.expect_accept_linked().times(0);
        {
            let invite = invite.clone();
            relationship_repo
                .expect_find_by_id()
                .returning(move |_| Ok(Some(invite.clone())));
        }

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email_and_type()
            .returning(|_, _| Ok(None));
        user_repo.expect_create().returning(|input| {
            Ok(User {
                email: input.email.clone(),
                ..Default::default()
            })
        });

        let mut home_repo = MockHomeRepository::new();
        home_repo.expect_create().returning(|input| {
            Ok(Home {
                owner_id: input.owner_id,
                ..Default::default()
            })
        });
        // The cleaner withdrew: never becomes the preferred cleaner
        home_repo.expect_set_preferred_cleaner().times(0);

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_create_zero_balance()
            .returning(|_| Ok(()));

        let service = build_service(
            relationship_repo,
            user_repo,
            home_repo,
            billing_repo,
            MockScheduleRepository::new(),
        );

        let accepted = service.accept(&token, accept_input()).await.unwrap();
        // Status untouched by the unlinked path
        assert_eq!(
            accepted.relationship.status,
            RelationshipStatus::Cancelled
        );
        assert!(accepted.relationship.client_id.is_none());
    }

    #[tokio::test]
    async fn test_accept_existing_homeowner_account_fails() {
        let token = valid_token();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        {
            let invite = pending_invite(&token);
            relationship_repo
                .expect_find_by_token()
                .returning(move |_| Ok(Some(invite.clone())));
        }

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email_and_type()
            .returning(|email, _| {
                Ok(Some(User {
                    email: email.to_string(),
                    ..Default::default()
                }))
            });
        // Nothing gets created
        user_repo.expect_create().times(0);

        let mut billing_repo = MockBillingRepository::new();
        billing_repo.expect_create_zero_balance().times(0);

        let service = build_service(
            relationship_repo,
            user_repo,
            MockHomeRepository::new(),
            billing_repo,
            MockScheduleRepository::new(),
        );

        let result = service.accept(&token, accept_input()).await;
        assert!(matches!(result, Err(AppError::AccountExists)));
    }

    #[tokio::test]
    async fn test_accept_already_accepted_fails() {
        let token = valid_token();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo.expect_find_by_token().returning(|t| {
            Ok(Some(ClientRelationship {
                invite_token: t.to_string(),
                status: RelationshipStatus::Active,
                ..Default::default()
            }))
        });

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service.accept(&token, accept_input()).await;
        assert!(matches!(result, Err(AppError::AlreadyAccepted)));
    }

    #[tokio::test]
    async fn test_accept_declined_fails() {
        let token = valid_token();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo.expect_find_by_token().returning(|t| {
            Ok(Some(ClientRelationship {
                invite_token: t.to_string(),
                status: RelationshipStatus::Declined,
                ..Default::default()
            }))
        });

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service.accept(&token, accept_input()).await;
        assert!(matches!(result, Err(AppError::InviteDeclined)));
    }

    #[tokio::test]
    async fn test_accept_unknown_token_fails() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_by_token()
            .returning(|_| Ok(None));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service.accept(&valid_token(), accept_input()).await;
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_accept_loses_race_fails_already_accepted() {
        let token = valid_token();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        {
            let invite = pending_invite(&token);
            relationship_repo
                .expect_find_by_token()
                .returning(move |_| Ok(Some(invite.clone())));
        }
        // Guarded UPDATE matched nothing: someone else accepted in between
        relationship_repo
            .expect_accept_linked()
            .returning(|_, _, _| Ok(0));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email_and_type()
            .returning(|_, _| Ok(None));
        user_repo.expect_create().returning(|input| {
            Ok(User {
                email: input.email.clone(),
                ..Default::default()
            })
        });

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_create_zero_balance()
            .returning(|_| Ok(()));

        let service = build_service(
            relationship_repo,
            user_repo,
            MockHomeRepository::new(),
            billing_repo,
            MockScheduleRepository::new(),
        );

        let result = service.accept(&token, accept_input()).await;
        assert!(matches!(result, Err(AppError::AlreadyAccepted)));
    }

    #[tokio::test]
    async fn test_accept_without_address_creates_no_home() {
        let token = valid_token();
        let invite_id = StringUuid::new_v4();

        let mut invite = pending_invite(&token);
        invite.id = invite_id;
        invite.invited_address = None;

        let mut relationship_repo = MockClientRelationshipRepository::new();
        {
            let invite = invite.clone();
            relationship_repo
                .expect_find_by_token()
                .returning(move |_| Ok(Some(invite.clone())));
        }
        relationship_repo
            .expect_accept_linked()
            .withf(|_, _, home_id| home_id.is_none())
            .returning(|_, _, _| Ok(1));
        relationship_repo.expect_find_by_id().returning(move |id| {
            Ok(Some(ClientRelationship {
                id,
                status: RelationshipStatus::Active,
                ..Default::default()
            }))
        });

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email_and_type()
            .returning(|_, _| Ok(None));
        user_repo.expect_create().returning(|input| {
            Ok(User {
                email: input.email.clone(),
                ..Default::default()
            })
        });

        let mut home_repo = MockHomeRepository::new();
        home_repo.expect_create().times(0);
        home_repo.expect_set_preferred_cleaner().times(0);

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_create_zero_balance()
            .returning(|_| Ok(()));

        let service = build_service(
            relationship_repo,
            user_repo,
            home_repo,
            billing_repo,
            MockScheduleRepository::new(),
        );

        let accepted = service.accept(&token, accept_input()).await.unwrap();
        assert!(accepted.home.is_none());
    }

    #[tokio::test]
    async fn test_accept_address_corrections_win() {
        let token = valid_token();

        let mut invite = pending_invite(&token);
        invite.invited_address = AddressInput {
            line1: Some("12 Elm St".to_string()),
            city: Some("Springfield".to_string()),
            ..Default::default()
        }
        .to_stored();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        {
            let invite = invite.clone();
            relationship_repo
                .expect_find_by_token()
                .returning(move |_| Ok(Some(invite.clone())));
        }
        relationship_repo
            .expect_accept_linked()
            .returning(|_, _, _| Ok(1));
        relationship_repo.expect_find_by_id().returning(move |id| {
            Ok(Some(ClientRelationship {
                id,
                status: RelationshipStatus::Active,
                ..Default::default()
            }))
        });

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email_and_type()
            .returning(|_, _| Ok(None));
        user_repo.expect_create().returning(|input| {
            Ok(User {
                email: input.email.clone(),
                ..Default::default()
            })
        });

        let mut home_repo = MockHomeRepository::new();
        home_repo
            .expect_create()
            .withf(|input| {
                // corrected line1, untouched city
                input.address_line1 == "14 Oak Ave" && input.city.as_deref() == Some("Springfield")
            })
            .returning(|input| {
                Ok(Home {
                    owner_id: input.owner_id,
                    address_line1: input.address_line1.clone(),
                    ..Default::default()
                })
            });
        home_repo
            .expect_set_preferred_cleaner()
            .returning(|_, _| Ok(()));

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_create_zero_balance()
            .returning(|_| Ok(()));

        let service = build_service(
            relationship_repo,
            user_repo,
            home_repo,
            billing_repo,
            MockScheduleRepository::new(),
        );

        let input = AcceptInvitationInput {
            password: "a-long-enough-password".to_string(),
            phone: None,
            address_corrections: Some(AddressInput {
                line1: Some("14 Oak Ave".to_string()),
                ..Default::default()
            }),
        };

        assert!(service.accept(&token, input).await.is_ok());
    }

    // ------------------------------------------------------------------
    // decline / resend
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_decline_pending_succeeds() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo.expect_decline().returning(|_| Ok(1));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        assert!(service.decline(&valid_token()).await.is_ok());
    }

    #[tokio::test]
    async fn test_decline_non_pending_fails() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo.expect_decline().returning(|_| Ok(0));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service.decline(&valid_token()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resend_pending_succeeds() {
        let id = StringUuid::new_v4();
        let cleaner_id = StringUuid::new_v4();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_touch_reminder()
            .with(eq(id), eq(cleaner_id))
            .returning(|_, _| Ok(1));
        relationship_repo
            .expect_find_owned()
            .returning(move |id, cleaner_id| {
                Ok(Some(ClientRelationship {
                    id,
                    cleaner_id,
                    last_invite_reminder_at: Some(chrono::Utc::now()),
                    ..Default::default()
                }))
            });

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let relationship = service.resend(id, cleaner_id).await.unwrap();
        assert!(relationship.last_invite_reminder_at.is_some());
    }

    #[tokio::test]
    async fn test_resend_foreign_or_non_pending_fails() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_touch_reminder()
            .returning(|_, _| Ok(0));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service.resend(StringUuid::new_v4(), StringUuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    // ------------------------------------------------------------------
    // remove
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_remove_pending_cancels_without_cascade() {
        let id = StringUuid::new_v4();
        let cleaner_id = StringUuid::new_v4();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_owned()
            .returning(move |id, cleaner_id| {
                Ok(Some(ClientRelationship {
                    id,
                    cleaner_id,
                    status: RelationshipStatus::PendingInvite,
                    ..Default::default()
                }))
            });
        relationship_repo
            .expect_update_status()
            .with(eq(id), eq(RelationshipStatus::Cancelled))
            .times(1)
            .returning(|id, status| {
                Ok(ClientRelationship {
                    id,
                    status,
                    ..Default::default()
                })
            });

        let mut schedule_repo = MockScheduleRepository::new();
        schedule_repo.expect_deactivate_for_relationship().times(0);
        schedule_repo.expect_delete_future_appointments().times(0);

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            schedule_repo,
        );

        let outcome = service.remove(id, cleaner_id).await.unwrap();
        assert_eq!(outcome, RemoveOutcome::InvitationCancelled);
    }

    #[tokio::test]
    async fn test_remove_active_cascades_and_adjusts_bill() {
        let id = StringUuid::new_v4();
        let cleaner_id = StringUuid::new_v4();
        let client_id = StringUuid::new_v4();

        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_owned()
            .returning(move |id, cleaner_id| {
                Ok(Some(ClientRelationship {
                    id,
                    cleaner_id,
                    client_id: Some(client_id),
                    status: RelationshipStatus::Active,
                    ..Default::default()
                }))
            });
        relationship_repo
            .expect_update_status()
            .with(eq(id), eq(RelationshipStatus::Inactive))
            .times(1)
            .returning(|id, status| {
                Ok(ClientRelationship {
                    id,
                    status,
                    ..Default::default()
                })
            });

        let mut schedule_repo = MockScheduleRepository::new();
        schedule_repo
            .expect_deactivate_for_relationship()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(2));
        schedule_repo
            .expect_delete_future_appointments()
            .with(eq(id))
            .times(1)
            .returning(|_| {
                Ok(CancelledAppointments {
                    count: 4,
                    price_sum_cents: 48000,
                })
            });

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_adjust_balance()
            .with(eq(client_id), eq(-48000))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            billing_repo,
            schedule_repo,
        );

        let outcome = service.remove(id, cleaner_id).await.unwrap();
        assert_eq!(
            outcome,
            RemoveOutcome::RelationshipDeactivated {
                cancelled_appointments: 4
            }
        );
    }

    #[tokio::test]
    async fn test_remove_foreign_relationship_is_not_found() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_owned()
            .returning(|_, _| Ok(None));

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service
            .remove(StringUuid::new_v4(), StringUuid::new_v4())
            .await;
        // 404 rather than 403: no existence leakage across cleaners
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_already_ended_fails() {
        let mut relationship_repo = MockClientRelationshipRepository::new();
        relationship_repo
            .expect_find_owned()
            .returning(|id, cleaner_id| {
                Ok(Some(ClientRelationship {
                    id,
                    cleaner_id,
                    status: RelationshipStatus::Inactive,
                    ..Default::default()
                }))
            });

        let service = build_service(
            relationship_repo,
            MockUserRepository::new(),
            MockHomeRepository::new(),
            MockBillingRepository::new(),
            MockScheduleRepository::new(),
        );

        let result = service
            .remove(StringUuid::new_v4(), StringUuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
