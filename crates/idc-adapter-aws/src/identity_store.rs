use crate::AwsDirectory;
use crate::document::to_document;
use crate::error::{build_error, client_error};
use async_trait::async_trait;
use aws_sdk_identitystore::types as sdk;
use idc_core::model;
use idc_core::{
    Address, ChangeOperation, ClientError, Email, Enterprise, Group, GroupSpec, Name, PhoneNumber,
    User, UserSpec,
};
use idc_runtime::{AttributeFilter, IdentityStoreClient, Page};
use serde_json::json;

#[async_trait]
impl IdentityStoreClient for AwsDirectory {
    #[allow(deprecated)]
    async fn list_users(
        &self,
        identity_store_id: &str,
        filter: Option<&AttributeFilter>,
        next_token: Option<String>,
    ) -> Result<Page<User>, ClientError> {
        let output = self
            .identity_store
            .list_users()
            .identity_store_id(identity_store_id)
            .set_filters(filter.map(sdk_filter).transpose()?.map(|f| vec![f]))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| client_error("ListUsers", err))?;

        Ok(Page {
            items: output.users().iter().map(user_from_sdk).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn create_user(&self, identity_store_id: &str, user: &UserSpec) -> Result<String, ClientError> {
        let output = self
            .identity_store
            .create_user()
            .identity_store_id(identity_store_id)
            .user_name(&user.user_name)
            .set_name(user.name.as_ref().map(name_to_sdk))
            .set_display_name(user.display_name.clone())
            .set_nick_name(user.nick_name.clone())
            .set_profile_url(user.profile_url.clone())
            .set_emails(user.emails.as_ref().map(|list| list.iter().map(email_to_sdk).collect()))
            .set_addresses(user.addresses.as_ref().map(|list| list.iter().map(address_to_sdk).collect()))
            .set_phone_numbers(
                user.phone_numbers
                    .as_ref()
                    .map(|list| list.iter().map(phone_number_to_sdk).collect()),
            )
            .set_user_type(user.user_type.clone())
            .set_title(user.title.clone())
            .set_preferred_language(user.preferred_language.clone())
            .set_locale(user.locale.clone())
            .set_timezone(user.timezone.clone())
            .send()
            .await
            .map_err(|err| client_error("CreateUser", err))?;

        let user_id = output.user_id().to_string();

        // Enterprise attributes are not part of the create request shape.
        let operations = enterprise_operations(user.enterprise.as_ref());
        if !operations.is_empty() {
            self.update_user(identity_store_id, &user_id, &operations)
                .await
                .map_err(|err| enterprise_follow_up_error(&user_id, err))?;
        }

        Ok(user_id)
    }

    async fn update_user(
        &self,
        identity_store_id: &str,
        user_id: &str,
        operations: &[ChangeOperation],
    ) -> Result<(), ClientError> {
        self.identity_store
            .update_user()
            .identity_store_id(identity_store_id)
            .user_id(user_id)
            .set_operations(Some(attribute_operations("UpdateUser", operations)?))
            .send()
            .await
            .map_err(|err| client_error("UpdateUser", err))?;
        Ok(())
    }

    async fn delete_user(&self, identity_store_id: &str, user_id: &str) -> Result<(), ClientError> {
        self.identity_store
            .delete_user()
            .identity_store_id(identity_store_id)
            .user_id(user_id)
            .send()
            .await
            .map_err(|err| client_error("DeleteUser", err))?;
        Ok(())
    }

    #[allow(deprecated)]
    async fn list_groups(
        &self,
        identity_store_id: &str,
        filter: Option<&AttributeFilter>,
        next_token: Option<String>,
    ) -> Result<Page<Group>, ClientError> {
        let output = self
            .identity_store
            .list_groups()
            .identity_store_id(identity_store_id)
            .set_filters(filter.map(sdk_filter).transpose()?.map(|f| vec![f]))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| client_error("ListGroups", err))?;

        Ok(Page {
            items: output.groups().iter().map(group_from_sdk).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn create_group(&self, identity_store_id: &str, group: &GroupSpec) -> Result<String, ClientError> {
        let output = self
            .identity_store
            .create_group()
            .identity_store_id(identity_store_id)
            .display_name(&group.display_name)
            .set_description(group.description.clone())
            .send()
            .await
            .map_err(|err| client_error("CreateGroup", err))?;
        Ok(output.group_id().to_string())
    }

    async fn update_group(
        &self,
        identity_store_id: &str,
        group_id: &str,
        operations: &[ChangeOperation],
    ) -> Result<(), ClientError> {
        self.identity_store
            .update_group()
            .identity_store_id(identity_store_id)
            .group_id(group_id)
            .set_operations(Some(attribute_operations("UpdateGroup", operations)?))
            .send()
            .await
            .map_err(|err| client_error("UpdateGroup", err))?;
        Ok(())
    }

    async fn delete_group(&self, identity_store_id: &str, group_id: &str) -> Result<(), ClientError> {
        self.identity_store
            .delete_group()
            .identity_store_id(identity_store_id)
            .group_id(group_id)
            .send()
            .await
            .map_err(|err| client_error("DeleteGroup", err))?;
        Ok(())
    }
}

fn sdk_filter(filter: &AttributeFilter) -> Result<sdk::Filter, ClientError> {
    sdk::Filter::builder()
        .attribute_path(&filter.attribute_path)
        .attribute_value(&filter.attribute_value)
        .build()
        .map_err(|err| build_error("Filter", err))
}

fn attribute_operations(
    operation: &str,
    operations: &[ChangeOperation],
) -> Result<Vec<sdk::AttributeOperation>, ClientError> {
    operations
        .iter()
        .map(|op| {
            sdk::AttributeOperation::builder()
                .attribute_path(&op.attribute_path)
                .attribute_value(to_document(&op.value))
                .build()
                .map_err(|err| build_error(operation, err))
        })
        .collect()
}

fn enterprise_follow_up_error(user_id: &str, err: ClientError) -> ClientError {
    ClientError::Api(format!(
        "user {user_id} was created but its enterprise attributes were not applied: {err}"
    ))
}

fn enterprise_operations(enterprise: Option<&Enterprise>) -> Vec<ChangeOperation> {
    let Some(enterprise) = enterprise else {
        return Vec::new();
    };

    [
        ("enterprise.employeeNumber", &enterprise.employee_number),
        ("enterprise.costCenter", &enterprise.cost_center),
        ("enterprise.organization", &enterprise.organization),
        ("enterprise.division", &enterprise.division),
        ("enterprise.department", &enterprise.department),
        ("enterprise.manager", &enterprise.manager),
    ]
    .into_iter()
    .filter_map(|(path, value)| value.as_ref().map(|v| ChangeOperation::new(path, json!(v))))
    .collect()
}

fn name_to_sdk(name: &Name) -> sdk::Name {
    sdk::Name::builder()
        .set_formatted(name.formatted.clone())
        .set_family_name(name.family_name.clone())
        .set_given_name(name.given_name.clone())
        .set_middle_name(name.middle_name.clone())
        .set_honorific_prefix(name.honorific_prefix.clone())
        .set_honorific_suffix(name.honorific_suffix.clone())
        .build()
}

fn email_to_sdk(email: &Email) -> sdk::Email {
    sdk::Email::builder()
        .set_value(email.value.clone())
        .set_type(email.kind.clone())
        .set_primary(email.primary)
        .build()
}

fn address_to_sdk(address: &Address) -> sdk::Address {
    sdk::Address::builder()
        .set_street_address(address.street_address.clone())
        .set_locality(address.locality.clone())
        .set_region(address.region.clone())
        .set_postal_code(address.postal_code.clone())
        .set_country(address.country.clone())
        .set_formatted(address.formatted.clone())
        .set_type(address.kind.clone())
        .set_primary(address.primary)
        .build()
}

fn phone_number_to_sdk(phone: &PhoneNumber) -> sdk::PhoneNumber {
    sdk::PhoneNumber::builder()
        .set_value(phone.value.clone())
        .set_type(phone.kind.clone())
        .set_primary(phone.primary)
        .build()
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

// The service reports an unset primary flag as `false`.
fn primary_flag(primary: bool) -> Option<bool> {
    model::primary_flag(Some(primary))
}

pub(crate) fn user_from_sdk(user: &sdk::User) -> User {
    User {
        user_id: user.user_id().to_string(),
        identity_store_id: user.identity_store_id().to_string(),
        user_name: owned(user.user_name()),
        name: user.name().map(|name| Name {
            formatted: owned(name.formatted()),
            family_name: owned(name.family_name()),
            given_name: owned(name.given_name()),
            middle_name: owned(name.middle_name()),
            honorific_prefix: owned(name.honorific_prefix()),
            honorific_suffix: owned(name.honorific_suffix()),
        }),
        display_name: owned(user.display_name()),
        nick_name: owned(user.nick_name()),
        profile_url: owned(user.profile_url()),
        emails: user
            .emails()
            .iter()
            .map(|email| Email {
                value: owned(email.value()),
                kind: owned(email.r#type()),
                primary: primary_flag(email.primary()),
            })
            .collect(),
        addresses: user
            .addresses()
            .iter()
            .map(|address| Address {
                street_address: owned(address.street_address()),
                locality: owned(address.locality()),
                region: owned(address.region()),
                postal_code: owned(address.postal_code()),
                country: owned(address.country()),
                formatted: owned(address.formatted()),
                kind: owned(address.r#type()),
                primary: primary_flag(address.primary()),
            })
            .collect(),
        phone_numbers: user
            .phone_numbers()
            .iter()
            .map(|phone| PhoneNumber {
                value: owned(phone.value()),
                kind: owned(phone.r#type()),
                primary: primary_flag(phone.primary()),
            })
            .collect(),
        user_type: owned(user.user_type()),
        title: owned(user.title()),
        preferred_language: owned(user.preferred_language()),
        locale: owned(user.locale()),
        timezone: owned(user.timezone()),
        // Not returned by ListUsers.
        enterprise: None,
    }
}

pub(crate) fn group_from_sdk(group: &sdk::Group) -> Group {
    Group {
        group_id: group.group_id().to_string(),
        identity_store_id: group.identity_store_id().to_string(),
        display_name: owned(group.display_name()),
        description: owned(group.description()),
    }
}
