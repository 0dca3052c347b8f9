/// diesel table for categories
table! {
    categories (id) {
        id -> Integer,
        name -> VarChar,
        description -> Nullable<VarChar>,
        parent_id -> Nullable<Integer>,
        show_in_print_overview -> Bool,
        created_at -> Timestamptz, // UTC, generated at db level
        updated_at -> Timestamptz, // UTC, generated at db level
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for equipment
table! {
    equipment (id) {
        id -> Integer,
        name -> VarChar,
        description -> Nullable<VarChar>,
        serial_number -> Nullable<VarChar>,
        barcode -> VarChar,
        category_id -> Integer,
        status -> VarChar,
        replacement_cost -> Numeric,
        notes -> Nullable<VarChar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for clients
table! {
    clients (id) {
        id -> Integer,
        name -> VarChar,
        email -> Nullable<VarChar>,
        phone -> Nullable<VarChar>,
        company -> Nullable<VarChar>,
        status -> VarChar,
        notes -> Nullable<VarChar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for projects
table! {
    projects (id) {
        id -> Integer,
        name -> VarChar,
        client_id -> Integer,
        start_date -> Timestamptz,
        end_date -> Timestamptz,
        status -> VarChar,
        payment_status -> VarChar,
        description -> Nullable<VarChar>,
        notes -> Nullable<VarChar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for bookings
table! {
    bookings (id) {
        id -> Integer,
        client_id -> Integer,
        equipment_id -> Integer,
        project_id -> Nullable<Integer>,
        start_date -> Timestamptz,
        end_date -> Timestamptz,
        quantity -> Integer,
        booking_status -> VarChar,
        payment_status -> VarChar,
        total_amount -> Numeric,
        paid_amount -> Numeric,
        deposit_amount -> Numeric,
        notes -> Nullable<VarChar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for documents
table! {
    documents (id) {
        id -> Integer,
        client_id -> Integer,
        booking_id -> Nullable<Integer>,
        #[sql_name = "type"]
        type_ -> VarChar,
        title -> VarChar,
        description -> Nullable<VarChar>,
        file_path -> VarChar,
        file_name -> VarChar,
        file_size -> Integer,
        mime_type -> VarChar,
        notes -> Nullable<VarChar>,
        status -> VarChar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for scan sessions
table! {
    scan_sessions (id) {
        id -> Integer,
        user_id -> Nullable<Integer>,
        name -> VarChar,
        items -> Jsonb,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for users; authentication is stubbed, the table is kept for
/// scan session ownership references
table! {
    users (id) {
        id -> Integer,
        email -> VarChar,
        hashed_password -> VarChar,
        is_active -> Bool,
        is_superuser -> Bool,
        full_name -> Nullable<VarChar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

/// diesel table for the global barcode sequence, a single row updated under a
/// row-level lock
table! {
    barcode_sequences (id) {
        id -> Integer,
        last_number -> Integer,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

/// diesel table for subcategory prefixes used on printed labels
table! {
    subcategory_prefixes (id) {
        id -> Integer,
        category_id -> Integer,
        name -> VarChar,
        prefix -> VarChar,
        description -> Nullable<VarChar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

joinable!(bookings -> clients (client_id));
joinable!(bookings -> equipment (equipment_id));
joinable!(bookings -> projects (project_id));
joinable!(equipment -> categories (category_id));
joinable!(projects -> clients (client_id));
joinable!(subcategory_prefixes -> categories (category_id));
allow_tables_to_appear_in_same_query!(bookings, clients, equipment, projects);
allow_tables_to_appear_in_same_query!(equipment, categories);
