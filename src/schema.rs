// Diesel table definitions; kept in sync with the DDL in `repository::init_schema`.

diesel::table! {
    players (id) {
        id -> Integer,
        name -> Text,
        possible_ban -> Integer,
        confirmed_ban -> Integer,
        confirmed_player -> Integer,
        label_id -> Nullable<Integer>,
        updated_at -> Nullable<Text>,
    }
}

diesel::table! {
    highscores (player_id, created_at) {
        player_id -> Integer,
        created_at -> Text,
        skills -> Text,
        minigames -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(players, highscores);
