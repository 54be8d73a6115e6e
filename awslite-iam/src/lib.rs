#![forbid(unsafe_code)]

//! IAM operation descriptors.
//!
//! IAM speaks the query protocol: every request carries `Action` and `Version` in the
//! query string, list arguments are flattened to `Name.member.N` by the engine, and
//! responses arrive as XML wrapped in an `{Action}Result` element. The service has one
//! global endpoint signed for `us-east-1`.

use std::sync::LazyLock;

use awslite_core::{
    into_list, normalize_object_arrays, Args, OperationDescriptor, ParamSpec, Paginator, Protocol,
    RawRequest, RawResponse, ServiceTable,
};
use serde_json::{json, Value as JsonValue};

pub const SERVICE: &str = "iam";
pub const VERSION: &str = "2010-05-08";
pub const GLOBAL_HOST: &str = "iam.amazonaws.com";
pub const SIGNING_REGION: &str = "us-east-1";

macro_rules! api_doc {
    ($page:literal) => {
        concat!("https://docs.aws.amazon.com/IAM/latest/APIReference/", $page)
    };
}

const TAGS_DOC: &str = "https://docs.aws.amazon.com/IAM/latest/UserGuide/id_tags.html";
const IDS_DOC: &str = "https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_identifiers.html";

const DESCRIPTION: ParamSpec = ParamSpec::string().comment("Description of the resource");
const GROUP_NAME: ParamSpec = ParamSpec::string()
    .required()
    .comment("Name of the group; names are not distinguished by case");
const INSTANCE_PROFILE_NAME: ParamSpec = ParamSpec::string()
    .required()
    .comment("Name of the instance profile");
const MARKER: ParamSpec = ParamSpec::string().comment("Pagination cursor");
const MAX_ITEMS: ParamSpec = ParamSpec::number()
    .comment("Maximum number of items to be returned in a response; at most 1000");
const MAX_SESSION_DURATION: ParamSpec = ParamSpec::number()
    .comment("Maximum session duration (in seconds) to set for the specified role");
const PATH: ParamSpec = ParamSpec::string()
    .comment("Path for the identifier")
    .docs(IDS_DOC);
const PATH_PREFIX: ParamSpec = ParamSpec::string().comment("Filter results by path prefix");
const PERMISSIONS_BOUNDARY: ParamSpec = ParamSpec::string()
    .comment("ARN of a managed policy to be used to set the resource's permissions boundary");
const POLICY_DOCUMENT: ParamSpec = ParamSpec::string_or_object()
    .required()
    .comment("The policy document; can be an object or a JSON string");
const POLICY_NAME: ParamSpec = ParamSpec::string().required().comment("Name of the policy");
const ROLE_NAME: ParamSpec = ParamSpec::string().required().comment("Name of the role");
const TAGS: ParamSpec = ParamSpec::array()
    .comment("List of `{ Key, Value }` tags to attach to the resource")
    .docs(TAGS_DOC);
const USER_NAME: ParamSpec = ParamSpec::string().required().comment("User name");

const ADD_ROLE_TO_INSTANCE_PROFILE: &[(&str, ParamSpec)] = &[
    ("InstanceProfileName", INSTANCE_PROFILE_NAME),
    ("RoleName", ROLE_NAME),
];

const CREATE_INSTANCE_PROFILE: &[(&str, ParamSpec)] = &[
    ("InstanceProfileName", INSTANCE_PROFILE_NAME),
    ("Path", PATH),
    ("Tags", TAGS),
];

const CREATE_ROLE: &[(&str, ParamSpec)] = &[
    (
        "AssumeRolePolicyDocument",
        ParamSpec::string_or_object()
            .required()
            .comment("Trust policy document granting an entity permission to assume the role"),
    ),
    ("RoleName", ROLE_NAME),
    ("Description", DESCRIPTION),
    ("MaxSessionDuration", MAX_SESSION_DURATION),
    ("Path", PATH),
    ("PermissionsBoundary", PERMISSIONS_BOUNDARY),
    ("Tags", TAGS),
];

const CREATE_USER: &[(&str, ParamSpec)] = &[
    ("UserName", USER_NAME),
    ("Path", PATH),
    ("PermissionsBoundary", PERMISSIONS_BOUNDARY),
    ("Tags", TAGS),
];

const INSTANCE_PROFILE_ONLY: &[(&str, ParamSpec)] =
    &[("InstanceProfileName", INSTANCE_PROFILE_NAME)];

const ROLE_ONLY: &[(&str, ParamSpec)] = &[("RoleName", ROLE_NAME)];

const USER_ONLY: &[(&str, ParamSpec)] = &[("UserName", USER_NAME)];

const GET_GROUP: &[(&str, ParamSpec)] = &[
    ("GroupName", GROUP_NAME),
    ("Marker", MARKER),
    ("MaxItems", MAX_ITEMS),
];

const LIST_INSTANCE_PROFILES: &[(&str, ParamSpec)] = &[
    ("Marker", MARKER),
    ("MaxItems", MAX_ITEMS),
    ("PathPrefix", PATH_PREFIX),
];

const LIST_INSTANCE_PROFILES_FOR_ROLE: &[(&str, ParamSpec)] = &[
    ("RoleName", ROLE_NAME),
    ("Marker", MARKER),
    ("MaxItems", MAX_ITEMS),
];

const LIST_USERS: &[(&str, ParamSpec)] = &[
    ("Marker", MARKER),
    ("MaxItems", MAX_ITEMS),
    ("PathPrefix", PATH_PREFIX),
];

const PUT_GROUP_POLICY: &[(&str, ParamSpec)] = &[
    ("GroupName", GROUP_NAME),
    ("PolicyDocument", POLICY_DOCUMENT),
    ("PolicyName", POLICY_NAME),
];

const PUT_ROLE_POLICY: &[(&str, ParamSpec)] = &[
    ("RoleName", ROLE_NAME),
    ("PolicyDocument", POLICY_DOCUMENT),
    ("PolicyName", POLICY_NAME),
];

const TAG_INSTANCE_PROFILE: &[(&str, ParamSpec)] = &[
    ("InstanceProfileName", INSTANCE_PROFILE_NAME),
    ("Tags", TAGS.required()),
];

const TAG_ROLE: &[(&str, ParamSpec)] = &[("RoleName", ROLE_NAME), ("Tags", TAGS.required())];

const UNTAG_INSTANCE_PROFILE: &[(&str, ParamSpec)] = &[
    ("InstanceProfileName", INSTANCE_PROFILE_NAME),
    ("TagKeys", ParamSpec::array().required().comment("Array of tag keys")),
];

const UPDATE_ROLE: &[(&str, ParamSpec)] = &[
    ("RoleName", ROLE_NAME),
    ("Description", DESCRIPTION),
    ("MaxSessionDuration", MAX_SESSION_DURATION),
];

/// Query-protocol request for `action`. `Action` and `Version` always win over
/// caller arguments of the same name.
fn query(action: &'static str, args: &Args) -> RawRequest {
    let mut query = args.clone();
    query.insert("Action".into(), action.into());
    query.insert("Version".into(), VERSION.into());
    RawRequest::with_query(query)
}

mod request {
    #![allow(non_snake_case)]

    use awslite_core::{Args, RawRequest};

    macro_rules! actions {
        ($($action:ident),* $(,)?) => {
            $(
                pub(super) fn $action(args: &Args) -> RawRequest {
                    super::query(stringify!($action), args)
                }
            )*
        };
    }

    actions!(
        AddRoleToInstanceProfile,
        CreateInstanceProfile,
        CreateRole,
        CreateUser,
        DeleteInstanceProfile,
        DeleteRole,
        GetGroup,
        GetInstanceProfile,
        GetRole,
        GetUser,
        ListInstanceProfiles,
        ListInstanceProfilesForRole,
        ListUsers,
        PutGroupPolicy,
        PutRolePolicy,
        RemoveRoleFromInstanceProfile,
        TagInstanceProfile,
        TagRole,
        UntagInstanceProfile,
        UpdateRole,
    );
}

/// `Marker` query cursor over `{result}.Marker`, accumulating `{result}.{list}.member`.
fn marker_paginator(result: &str, list: &str) -> Paginator {
    Paginator::query("Marker")
        .with_token(format!("{result}.Marker"))
        .with_accumulator(format!("{result}.{list}.member"))
}

/// Replace a present `key` with its member list.
fn unwrap_members(value: &mut JsonValue, key: &str) {
    if let Some(slot) = value.get_mut(key) {
        let taken = std::mem::take(slot);
        *slot = JsonValue::Array(into_list(taken));
    }
}

fn empty(_: RawResponse) -> JsonValue {
    json!({})
}

const PROFILE_ARRAYS: &[&str] = &["Tags", "InstanceProfiles", "Roles"];

fn instance_profile_result(mut raw: RawResponse, key: &str) -> JsonValue {
    let mut result = raw.take_result(key);
    if let Some(profile) = result.get_mut("InstanceProfile") {
        normalize_object_arrays(profile, PROFILE_ARRAYS, &["Roles", "Tags"]);
    }
    result
}

fn create_instance_profile(raw: RawResponse) -> JsonValue {
    instance_profile_result(raw, "CreateInstanceProfileResult")
}

fn get_instance_profile(raw: RawResponse) -> JsonValue {
    instance_profile_result(raw, "GetInstanceProfileResult")
}

fn role_result(mut raw: RawResponse, key: &str) -> JsonValue {
    let mut result = raw.take_result(key);
    if let Some(role) = result.get_mut("Role") {
        unwrap_members(role, "Tags");
    }
    result
}

fn create_role(raw: RawResponse) -> JsonValue {
    role_result(raw, "CreateRoleResult")
}

fn get_role(raw: RawResponse) -> JsonValue {
    role_result(raw, "GetRoleResult")
}

fn user_result(mut raw: RawResponse, key: &str) -> JsonValue {
    let mut result = raw.take_result(key);
    if let Some(user) = result.get_mut("User") {
        unwrap_members(user, "Tags");
    }
    result
}

fn create_user(raw: RawResponse) -> JsonValue {
    user_result(raw, "CreateUserResult")
}

fn get_user(raw: RawResponse) -> JsonValue {
    user_result(raw, "GetUserResult")
}

fn get_group(mut raw: RawResponse) -> JsonValue {
    let mut result = raw.take_result("GetGroupResult");
    normalize_object_arrays(&mut result, &["Users"], &["Users"]);
    let mut take = |key: &str| {
        result
            .get_mut(key)
            .map(JsonValue::take)
            .unwrap_or(JsonValue::Null)
    };
    json!({
        "Group": take("Group"),
        "Users": take("Users"),
    })
}

fn list_instance_profiles(mut raw: RawResponse) -> JsonValue {
    let mut result = raw.take_result("ListInstanceProfilesResult");
    normalize_object_arrays(&mut result, PROFILE_ARRAYS, &["InstanceProfiles"]);
    result
}

fn list_instance_profiles_for_role(mut raw: RawResponse) -> JsonValue {
    let mut result = raw.take_result("ListInstanceProfilesForRoleResult");
    normalize_object_arrays(&mut result, PROFILE_ARRAYS, &["InstanceProfiles"]);
    result
}

fn list_users(mut raw: RawResponse) -> JsonValue {
    let mut result = raw.take_result("ListUsersResult");
    normalize_object_arrays(&mut result, &["Users"], &["Users"]);
    result
}

static TABLE: LazyLock<ServiceTable> = LazyLock::new(|| {
    let op = OperationDescriptor::new;
    ServiceTable::new(SERVICE, Protocol::Query)
        .global(GLOBAL_HOST, SIGNING_REGION)
        .with(
            op(
                "AddRoleToInstanceProfile",
                ADD_ROLE_TO_INSTANCE_PROFILE,
                request::AddRoleToInstanceProfile,
                empty,
            )
            .docs(api_doc!("API_AddRoleToInstanceProfile.html")),
        )
        .with(
            op(
                "CreateInstanceProfile",
                CREATE_INSTANCE_PROFILE,
                request::CreateInstanceProfile,
                create_instance_profile,
            )
            .docs(api_doc!("API_CreateInstanceProfile.html")),
        )
        .with(
            op("CreateRole", CREATE_ROLE, request::CreateRole, create_role)
                .docs(api_doc!("API_CreateRole.html")),
        )
        .with(
            op("CreateUser", CREATE_USER, request::CreateUser, create_user)
                .docs(api_doc!("API_CreateUser.html")),
        )
        .with(
            op(
                "DeleteInstanceProfile",
                INSTANCE_PROFILE_ONLY,
                request::DeleteInstanceProfile,
                empty,
            )
            .docs(api_doc!("API_DeleteInstanceProfile.html")),
        )
        .with(
            op("DeleteRole", ROLE_ONLY, request::DeleteRole, empty)
                .docs(api_doc!("API_DeleteRole.html")),
        )
        .with(
            op("GetGroup", GET_GROUP, request::GetGroup, get_group)
                .docs(api_doc!("API_GetGroup.html"))
                .paginated(marker_paginator("GetGroupResult", "Users")),
        )
        .with(
            op(
                "GetInstanceProfile",
                INSTANCE_PROFILE_ONLY,
                request::GetInstanceProfile,
                get_instance_profile,
            )
            .docs(api_doc!("API_GetInstanceProfile.html")),
        )
        .with(
            op("GetRole", ROLE_ONLY, request::GetRole, get_role)
                .docs(api_doc!("API_GetRole.html")),
        )
        .with(
            op("GetUser", USER_ONLY, request::GetUser, get_user)
                .docs(api_doc!("API_GetUser.html")),
        )
        .with(
            op(
                "ListInstanceProfiles",
                LIST_INSTANCE_PROFILES,
                request::ListInstanceProfiles,
                list_instance_profiles,
            )
            .docs(api_doc!("API_ListInstanceProfiles.html"))
            .paginated(marker_paginator("ListInstanceProfilesResult", "InstanceProfiles")),
        )
        .with(
            op(
                "ListInstanceProfilesForRole",
                LIST_INSTANCE_PROFILES_FOR_ROLE,
                request::ListInstanceProfilesForRole,
                list_instance_profiles_for_role,
            )
            .docs(api_doc!("API_ListInstanceProfilesForRole.html"))
            .paginated(marker_paginator("ListInstanceProfilesForRoleResult", "InstanceProfiles")),
        )
        .with(
            op("ListUsers", LIST_USERS, request::ListUsers, list_users)
                .docs(api_doc!("API_ListUsers.html"))
                .paginated(marker_paginator("ListUsersResult", "Users")),
        )
        .with(
            op("PutGroupPolicy", PUT_GROUP_POLICY, request::PutGroupPolicy, empty)
                .docs(api_doc!("API_PutGroupPolicy.html")),
        )
        .with(
            op("PutRolePolicy", PUT_ROLE_POLICY, request::PutRolePolicy, empty)
                .docs(api_doc!("API_PutRolePolicy.html")),
        )
        .with(
            op(
                "RemoveRoleFromInstanceProfile",
                ADD_ROLE_TO_INSTANCE_PROFILE,
                request::RemoveRoleFromInstanceProfile,
                empty,
            )
            .docs(api_doc!("API_RemoveRoleFromInstanceProfile.html")),
        )
        .with(
            op("TagInstanceProfile", TAG_INSTANCE_PROFILE, request::TagInstanceProfile, empty)
                .docs(api_doc!("API_TagInstanceProfile.html")),
        )
        .with(
            op("TagRole", TAG_ROLE, request::TagRole, empty)
                .docs(api_doc!("API_TagRole.html")),
        )
        .with(
            op(
                "UntagInstanceProfile",
                UNTAG_INSTANCE_PROFILE,
                request::UntagInstanceProfile,
                empty,
            )
            .docs(api_doc!("API_UntagInstanceProfile.html")),
        )
        .with(
            op("UpdateRole", UPDATE_ROLE, request::UpdateRole, empty)
                .docs(api_doc!("API_UpdateRole.html")),
        )
});

/// The IAM service table.
pub fn table() -> &'static ServiceTable {
    &TABLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn response(payload: JsonValue) -> RawResponse {
        RawResponse {
            status_code: 200,
            headers: BTreeMap::new(),
            payload,
        }
    }

    #[test]
    fn every_operation_is_registered_with_docs() {
        let table = table();
        assert_eq!(table.operations().count(), 20);
        for name in table.operations() {
            let op = table.get(name).unwrap();
            assert!(op.docs.unwrap().ends_with(&format!("API_{name}.html")), "{name}");
        }
    }

    #[test]
    fn action_and_version_cannot_be_overridden() {
        let mut args = Args::new();
        args.insert("Action".into(), json!("DeleteUser"));
        args.insert("RoleName".into(), json!("r"));
        let raw = (table().get("DeleteRole").unwrap().request)(&args);
        let query = raw.query.unwrap();
        assert_eq!(query["Action"], json!("DeleteRole"));
        assert_eq!(query["Version"], json!(VERSION));
        assert_eq!(query["RoleName"], json!("r"));
        assert!(raw.payload.is_none());
    }

    #[test]
    fn list_paginators_point_at_member_lists() {
        let spec = table()
            .get("ListInstanceProfiles")
            .unwrap()
            .paginator
            .as_ref()
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(spec.cursor, "Marker");
        assert_eq!(spec.token.to_string(), "ListInstanceProfilesResult.Marker");
        assert_eq!(
            spec.accumulator.unwrap().to_string(),
            "ListInstanceProfilesResult.InstanceProfiles.member"
        );
        assert!(table().get("GetRole").unwrap().paginator.is_none());
    }

    #[test]
    fn user_tags_are_unwrapped_only_when_present() {
        let with_tags = get_user(response(json!({
            "GetUserResult": {"User": {
                "UserName": "u",
                "Tags": {"member": {"Key": "a", "Value": "b"}}
            }}
        })));
        assert_eq!(with_tags["User"]["Tags"], json!([{"Key": "a", "Value": "b"}]));

        let without = get_user(response(json!({"GetUserResult": {"User": {"UserName": "u"}}})));
        assert_eq!(without, json!({"User": {"UserName": "u"}}));
    }

    #[test]
    fn group_users_default_to_empty() {
        let out = get_group(response(json!({
            "GetGroupResult": {"Group": {"GroupName": "g"}, "Users": "", "IsTruncated": "false"}
        })));
        assert_eq!(out, json!({"Group": {"GroupName": "g"}, "Users": []}));
    }
}
