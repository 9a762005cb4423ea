//! Rule sets for every request body the service accepts.

use std::sync::LazyLock;

use crate::schema::{Field, Schema};

fn name() -> Field {
    Field::object(
        "name",
        vec![
            Field::string("first").min(2).max(256).required(),
            Field::string("middle").max(256).allow_empty(),
            Field::string("last").min(2).max(256).required(),
        ],
    )
    .required()
}

fn phone() -> Field {
    Field::string("phone").min(9).max(11).required()
}

fn email() -> Field {
    Field::string("email").min(5).email().required()
}

fn password() -> Field {
    Field::string("password").min(6).strong_password()
}

fn address() -> Field {
    Field::object(
        "address",
        vec![
            Field::string("state").max(256).allow_empty(),
            Field::string("country").min(2).max(256).required(),
            Field::string("city").min(2).max(256).required(),
            Field::string("street").min(2).max(256).required(),
            Field::integer("houseNumber").min(0).required(),
            Field::integer("zip").min(0).required(),
        ],
    )
    .required()
}

fn profile_image() -> Field {
    Field::object(
        "image",
        vec![
            Field::string("url").uri().allow_empty(),
            Field::string("alt").max(256).allow_empty(),
        ],
    )
}

/// Capped at `i64::MAX` so every accepted number fits a `BIGINT` column.
fn biz_number() -> Field {
    Field::integer("bizNumber").min(0).max(i64::MAX).required()
}

pub static REGISTER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        name(),
        phone(),
        email(),
        password().required(),
        profile_image(),
        address(),
        Field::boolean("isBusiness").required(),
        Field::boolean("isAdmin").required(),
    ])
});

pub static LOGIN: LazyLock<Schema> =
    LazyLock::new(|| Schema::new(vec![email(), password().required()]));

/// Profile update: the registration shape with password and role flags
/// optional. A supplied password is re-hashed.
pub static UPDATE_USER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        name(),
        phone(),
        email(),
        password(),
        profile_image(),
        address(),
        Field::boolean("isBusiness"),
        Field::boolean("isAdmin"),
    ])
});

/// Card create and full update.
pub static CARD: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(vec![
        Field::string("title").min(2).max(256).required(),
        Field::string("subtitle").max(256).allow_empty().required(),
        Field::string("description").max(1024).allow_empty(),
        phone(),
        email(),
        Field::string("web").min(14).uri(),
        Field::object(
            "image",
            vec![Field::string("url").uri(), Field::string("alt").max(256).allow_empty()],
        )
        .required(),
        address(),
        biz_number(),
        // Accepted for compatibility; the owner is always the caller.
        Field::string("user_id"),
    ])
});

pub static BIZ_NUMBER: LazyLock<Schema> = LazyLock::new(|| Schema::new(vec![biz_number()]));
