// Dates are RFC 3339 text; JSON columns are text.

diesel::table! {
    clients (id) {
        id -> Text,
        user_id -> Text,
        name -> Text,
        email -> Nullable<Text>,
        company -> Nullable<Text>,
        notes -> Nullable<Text>,
        sentiment_score -> Nullable<Integer>,
        sentiment_status -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    contracts (id) {
        id -> Text,
        user_id -> Text,
        client_id -> Nullable<Text>,
        title -> Text,
        content -> Nullable<Text>,
        status -> Text,
        risk_score -> Nullable<Integer>,
        analysis -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    testimonials (id) {
        id -> Text,
        user_id -> Text,
        client_name -> Text,
        client_email -> Text,
        project -> Nullable<Text>,
        token -> Text,
        status -> Text,
        content -> Nullable<Text>,
        video_url -> Nullable<Text>,
        expires_at -> Text,
        submitted_at -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    vault (user_id) {
        user_id -> Text,
        currency -> Text,
        hourly_rate -> Double,
        ai_tone -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(clients, contracts, testimonials, vault,);
