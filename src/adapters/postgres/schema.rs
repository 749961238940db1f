//! Table definitions created on first use.

/// Executed in order, each as its own statement.
pub(super) const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        user_id           TEXT PRIMARY KEY,
        email             TEXT,
        role              TEXT NOT NULL DEFAULT 'user',
        marketing_opt_in  BOOLEAN NOT NULL DEFAULT FALSE,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS memberships (
        id                 UUID PRIMARY KEY,
        user_id            TEXT NOT NULL REFERENCES profiles(user_id) ON DELETE CASCADE,
        plan_id            TEXT NOT NULL,
        status             TEXT NOT NULL,
        payment_status     TEXT NOT NULL DEFAULT 'paid',
        access_code        TEXT,
        next_billing_date  TIMESTAMPTZ NOT NULL,
        start_date         TIMESTAMPTZ NOT NULL,
        end_date           TIMESTAMPTZ,
        created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at         TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS memberships_user_updated_idx
        ON memberships (user_id, updated_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS access_codes (
        id             UUID PRIMARY KEY,
        code           TEXT NOT NULL UNIQUE,
        user_id        TEXT NOT NULL,
        membership_id  UUID NOT NULL,
        plan_id        TEXT NOT NULL,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        expires_at     TIMESTAMPTZ NOT NULL,
        used_at        TIMESTAMPTZ,
        is_used        BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS discount_codes (
        code                 TEXT PRIMARY KEY,
        plan_id              TEXT NOT NULL DEFAULT 'all',
        discount_percentage  INTEGER NOT NULL CHECK (discount_percentage BETWEEN 0 AND 100),
        description          TEXT NOT NULL DEFAULT '',
        max_uses             INTEGER NOT NULL,
        current_uses         INTEGER NOT NULL DEFAULT 0,
        created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        expires_at           TIMESTAMPTZ NOT NULL,
        is_active            BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
];
