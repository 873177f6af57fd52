#![cfg(test)]

use crate::{BunkerWarz, BunkerWarzClient, Error, GameStatus, BUNKER, EMPTY, HOUSE};
use fhe_coprocessor::{FheCoprocessor, FheCoprocessorClient};
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{Address, BytesN, Env};

// ============================================================================
// Test Helpers
// ============================================================================

pub(crate) fn setup_test() -> (
    Env,
    BunkerWarzClient<'static>,
    FheCoprocessorClient<'static>,
    Address,
    Address,
    Address,
) {
    let env = Env::default();
    // Every rule runs as a chain of coprocessor calls; keep budget unlimited.
    env.cost_estimate().budget().reset_unlimited();
    env.mock_all_auths();

    env.ledger().set(soroban_sdk::testutils::LedgerInfo {
        timestamp: 1441065600,
        protocol_version: 25,
        sequence_number: 100,
        network_id: Default::default(),
        base_reserve: 10,
        min_temp_entry_ttl: u32::MAX / 2,
        min_persistent_entry_ttl: u32::MAX / 2,
        max_entry_ttl: u32::MAX / 2,
    });

    let fhe_addr = env.register(FheCoprocessor, (&public_key(&env, 0x5A),));
    let fhe = FheCoprocessorClient::new(&env, &fhe_addr);

    let admin = Address::generate(&env);
    let contract_id = env.register(BunkerWarz, (&admin, &fhe_addr));
    let client = BunkerWarzClient::new(&env, &contract_id);

    let alice = Address::generate(&env);
    let bob = Address::generate(&env);

    (env, client, fhe, admin, alice, bob)
}

pub(crate) fn assert_game_error<T, E>(
    result: &Result<Result<T, E>, Result<Error, soroban_sdk::InvokeError>>,
    expected_error: Error,
) {
    match result {
        Err(Ok(actual_error)) => {
            assert_eq!(*actual_error, expected_error);
        }
        _ => panic!("Expected contract error {:?}", expected_error),
    }
}

pub(crate) fn public_key(env: &Env, byte: u8) -> BytesN<32> {
    BytesN::from_array(env, &[byte; 32])
}

/// Encrypt `structure - 1` as `player` and build it.
pub(crate) fn build_as(
    client: &BunkerWarzClient,
    fhe: &FheCoprocessorClient,
    game_id: u32,
    player: &Address,
    row: u32,
    column: u32,
    structure: u32,
) {
    let input = fhe.encrypt(player, &(structure - 1));
    client.build(&game_id, player, &row, &column, &input);
}

/// Content of a cell on `player`'s own board, decrypted by `player`.
pub(crate) fn read_cell(
    env: &Env,
    client: &BunkerWarzClient,
    fhe: &FheCoprocessorClient,
    game_id: u32,
    player: &Address,
    row: u32,
    column: u32,
) -> u32 {
    let pk = public_key(env, 0xA1);
    let sealed = client.get_board_value(&game_id, &row, &column, player, &pk);
    fhe.decrypt(player, &pk, &sealed)
}

// ============================================================================
// Constructor / Config
// ============================================================================

#[test]
fn constructor_stores_admin_and_coprocessor() {
    let (_env, client, fhe, admin, _alice, _bob) = setup_test();
    assert_eq!(client.get_admin(), admin);
    assert_eq!(client.get_coprocessor(), fhe.address);
}

#[test]
fn set_coprocessor_only_affects_new_games() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&2, &2, &alice, &bob);

    let other = Address::generate(&env);
    client.set_coprocessor(&other);
    assert_eq!(client.get_coprocessor(), other);

    // The running game still computes on its original coprocessor.
    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &alice, 0, 0), HOUSE);
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn create_game_initializes_public_record() {
    let (_env, client, _fhe, _admin, alice, bob) = setup_test();
    assert_eq!(client.next_game_id(), 0);

    let game_id = client.create_game(&3, &2, &alice, &bob);
    assert_eq!(game_id, 0);

    let game = client.get_game(&game_id);
    assert_eq!(game.player1, alice);
    assert_eq!(game.player2, bob);
    assert_eq!(game.width, 3);
    assert_eq!(game.height, 2);
    assert_eq!(game.turn, 0);
    assert_eq!(game.status, GameStatus::Player1Turn);
    assert!(game.player1_armed);
    assert!(game.player2_armed);

    assert_eq!(client.next_game_id(), 1);
    assert_eq!(client.current_player(&game_id), alice);
}

#[test]
fn game_ids_increase_and_games_are_isolated() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let first = client.create_game(&2, &2, &alice, &bob);
    let second = client.create_game(&2, &2, &alice, &bob);
    assert_eq!(first, 0);
    assert_eq!(second, 1);
    assert_eq!(client.next_game_id(), 2);

    build_as(&client, &fhe, first, &alice, 0, 0, BUNKER);
    assert_eq!(read_cell(&env, &client, &fhe, first, &alice, 0, 0), BUNKER);
    assert_eq!(read_cell(&env, &client, &fhe, second, &alice, 0, 0), EMPTY);
    assert_eq!(client.get_game(&second).turn, 0);
}

#[test]
fn create_game_rejects_invalid_dimensions() {
    let (_env, client, _fhe, _admin, alice, bob) = setup_test();

    assert_game_error(&client.try_create_game(&0, &3, &alice, &bob), Error::InvalidDimensions);
    assert_game_error(&client.try_create_game(&3, &0, &alice, &bob), Error::InvalidDimensions);
    assert_game_error(&client.try_create_game(&17, &3, &alice, &bob), Error::InvalidDimensions);
    assert_game_error(&client.try_create_game(&3, &17, &alice, &bob), Error::InvalidDimensions);

    // Rejected creations do not consume ids.
    assert_eq!(client.next_game_id(), 0);
    assert_eq!(client.create_game(&16, &16, &alice, &bob), 0);
}

#[test]
fn unknown_game_is_rejected() {
    let (env, client, fhe, _admin, alice, _bob) = setup_test();

    assert_game_error(&client.try_get_game(&42), Error::UnknownGame);
    assert_game_error(&client.try_current_player(&42), Error::UnknownGame);
    assert_game_error(&client.try_send_missile(&42, &alice, &0), Error::UnknownGame);

    let input = fhe.encrypt(&alice, &0);
    assert_game_error(&client.try_build(&42, &alice, &0, &0, &input), Error::UnknownGame);
    assert_game_error(
        &client.try_get_missile_hit(&42, &alice, &public_key(&env, 1)),
        Error::UnknownGame,
    );
}

// ============================================================================
// Build
// ============================================================================

#[test]
fn build_stores_structure_and_passes_turn() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &3, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE);
    let game = client.get_game(&game_id);
    assert_eq!(game.turn, 1);
    assert_eq!(game.status, GameStatus::Player2Turn);
    assert!(game.player2_armed);
    assert_eq!(client.current_player(&game_id), bob);

    build_as(&client, &fhe, game_id, &bob, 0, 0, BUNKER);
    assert_eq!(client.get_game(&game_id).turn, 2);

    // Each player builds on their own board.
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &alice, 0, 0), HOUSE);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &bob, 0, 0), BUNKER);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &alice, 0, 1), EMPTY);
}

#[test]
fn build_out_of_turn_is_rejected_and_leaves_game_unchanged() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &3, &alice, &bob);
    let before = client.get_game(&game_id);

    let input = fhe.encrypt(&bob, &0);
    assert_game_error(&client.try_build(&game_id, &bob, &0, &0, &input), Error::NotYourTurn);

    let outsider = Address::generate(&env);
    let input = fhe.encrypt(&outsider, &0);
    assert_game_error(
        &client.try_build(&game_id, &outsider, &0, &0, &input),
        Error::NotYourTurn,
    );

    assert_eq!(client.get_game(&game_id), before);
}

#[test]
fn build_outside_board_is_rejected() {
    let (_env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &2, &alice, &bob);

    let input = fhe.encrypt(&alice, &0);
    assert_game_error(&client.try_build(&game_id, &alice, &2, &0, &input), Error::OutOfBounds);
    assert_game_error(&client.try_build(&game_id, &alice, &0, &3, &input), Error::OutOfBounds);
    assert_eq!(client.get_game(&game_id).turn, 0);
}

#[test]
fn build_on_occupied_cell_is_rejected() {
    let (_env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &3, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE);
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE);
    let before = client.get_game(&game_id);

    let input = fhe.encrypt(&alice, &1);
    assert_game_error(&client.try_build(&game_id, &alice, &0, &0, &input), Error::CellOccupied);
    assert_eq!(client.get_game(&game_id), before);
}

#[test]
fn build_without_support_is_rejected() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &3, &alice, &bob);
    let before = client.get_game(&game_id);

    let input = fhe.encrypt(&alice, &0);
    assert_game_error(
        &client.try_build(&game_id, &alice, &1, &0, &input),
        Error::UnsupportedPlacement,
    );
    assert_eq!(client.get_game(&game_id), before);

    // Once the cell below stands, stacking is fine.
    build_as(&client, &fhe, game_id, &alice, 0, 0, BUNKER);
    build_as(&client, &fhe, game_id, &bob, 0, 2, HOUSE);
    build_as(&client, &fhe, game_id, &alice, 1, 0, HOUSE);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &alice, 1, 0), HOUSE);
}

#[test]
fn build_above_destroyed_house_is_rejected() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &3, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE);
    client.send_missile(&game_id, &bob, &0);
    let before = client.get_game(&game_id);

    // The ruins at (0, 0) support nothing.
    let input = fhe.encrypt(&alice, &0);
    assert_game_error(
        &client.try_build(&game_id, &alice, &1, &0, &input),
        Error::UnsupportedPlacement,
    );
    assert_eq!(client.get_game(&game_id), before);

    // Rebuilding the ground floor restores support.
    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE);
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE);
    build_as(&client, &fhe, game_id, &alice, 1, 0, BUNKER);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &alice, 1, 0), BUNKER);
}

#[test]
fn build_rejects_input_not_encrypted_by_player() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &3, &alice, &bob);

    let bobs_input = fhe.encrypt(&bob, &0);
    assert_game_error(
        &client.try_build(&game_id, &alice, &0, &0, &bobs_input),
        Error::Unauthorized,
    );
    assert_eq!(client.get_game(&game_id).turn, 0);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &alice, 0, 0), EMPTY);
}

#[test]
fn build_clamps_unknown_structure_to_house() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&3, &3, &alice, &bob);

    let input = fhe.encrypt(&alice, &7);
    client.build(&game_id, &alice, &0, &0, &input);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &alice, 0, 0), HOUSE);

    let input = fhe.encrypt(&bob, &u32::MAX);
    client.build(&game_id, &bob, &0, &0, &input);
    assert_eq!(read_cell(&env, &client, &fhe, game_id, &bob, 0, 0), HOUSE);
}

// ============================================================================
// Board reads
// ============================================================================

#[test]
fn board_values_are_sealed_for_their_owner() {
    let (env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&2, &2, &alice, &bob);
    build_as(&client, &fhe, game_id, &alice, 0, 0, BUNKER);

    let pk = public_key(&env, 0x11);
    let sealed = client.get_board_value(&game_id, &0, &0, &alice, &pk);
    assert_eq!(fhe.decrypt(&alice, &pk, &sealed), BUNKER);
    assert!(fhe.try_decrypt(&bob, &pk, &sealed).is_err());
    assert!(fhe.try_decrypt(&alice, &public_key(&env, 0x22), &sealed).is_err());
}

#[test]
fn board_reads_by_outsiders_are_rejected() {
    let (env, client, _fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&2, &2, &alice, &bob);

    let carol = Address::generate(&env);
    assert_game_error(
        &client.try_get_board_value(&game_id, &0, &0, &carol, &public_key(&env, 1)),
        Error::Unauthorized,
    );
    assert_game_error(
        &client.try_get_board_value(&game_id, &2, &0, &alice, &public_key(&env, 1)),
        Error::OutOfBounds,
    );
}

// ============================================================================
// Win evaluation
// ============================================================================

#[test]
fn full_boards_end_game_with_more_houses_winning() {
    let (_env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&1, &2, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE);
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE);
    build_as(&client, &fhe, game_id, &alice, 1, 0, HOUSE);
    assert_eq!(client.get_game(&game_id).status, GameStatus::Player2Turn);
    build_as(&client, &fhe, game_id, &bob, 1, 0, BUNKER);

    let game = client.get_game(&game_id);
    assert_eq!(game.turn, 4);
    assert_eq!(game.status, GameStatus::Player1Won);

    assert_game_error(&client.try_current_player(&game_id), Error::GameOver);
    let input = fhe.encrypt(&alice, &0);
    assert_game_error(&client.try_build(&game_id, &alice, &0, &0, &input), Error::GameOver);
    assert_game_error(&client.try_send_missile(&game_id, &alice, &0), Error::GameOver);
    assert_eq!(client.get_game(&game_id).turn, 4);
}

#[test]
fn equal_house_counts_draw() {
    let (_env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&1, &1, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE);
    assert_eq!(client.get_game(&game_id).status, GameStatus::Player2Turn);
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE);

    assert_eq!(client.get_game(&game_id).status, GameStatus::Draw);
}

#[test]
fn bunkers_do_not_score() {
    let (_env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&1, &1, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, BUNKER);
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE);

    assert_eq!(client.get_game(&game_id).status, GameStatus::Player2Won);
}

#[test]
fn turn_limit_ends_game_without_full_boards() {
    let (_env, client, fhe, _admin, alice, bob) = setup_test();
    // Limit is 4 * 2 * 1 * 1 = 8 accepted actions.
    let game_id = client.create_game(&1, &1, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, HOUSE); // 1
    client.send_missile(&game_id, &bob, &0); // 2: alice's house falls
    client.send_missile(&game_id, &alice, &0); // 3: bob's board is empty
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE); // 4
    client.send_missile(&game_id, &alice, &0); // 5: bob's house falls

    // Alice has not built since bob's last missile.
    assert_game_error(
        &client.try_send_missile(&game_id, &bob, &0),
        Error::MissileAlreadyPending,
    );
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE); // 6
    client.send_missile(&game_id, &alice, &0); // 7: bob's house falls again
    assert_eq!(client.get_game(&game_id).status, GameStatus::Player2Turn);
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE); // 8

    let game = client.get_game(&game_id);
    assert_eq!(game.turn, 8);
    assert_eq!(game.status, GameStatus::Player2Won);
}

#[test]
fn player_with_full_board_and_no_missile_ends_game() {
    let (_env, client, fhe, _admin, alice, bob) = setup_test();
    let game_id = client.create_game(&2, &1, &alice, &bob);

    build_as(&client, &fhe, game_id, &alice, 0, 0, BUNKER); // 1
    client.send_missile(&game_id, &bob, &0); // 2: intercepted
    build_as(&client, &fhe, game_id, &alice, 0, 1, BUNKER); // 3
    build_as(&client, &fhe, game_id, &bob, 0, 0, HOUSE); // 4
    client.send_missile(&game_id, &alice, &1); // 5: miss
    assert_eq!(client.get_game(&game_id).status, GameStatus::Player2Turn);
    client.send_missile(&game_id, &bob, &1); // 6: intercepted

    // Alice's board is full and her missile is spent: she cannot move, so the
    // game is scored. Her spent bunkers are worth nothing.
    let game = client.get_game(&game_id);
    assert_eq!(game.turn, 6);
    assert!(!game.player1_armed);
    assert_eq!(game.status, GameStatus::Player2Won);
    assert_game_error(&client.try_current_player(&game_id), Error::GameOver);
    assert_game_error(&client.try_send_missile(&game_id, &alice, &0), Error::GameOver);
}
