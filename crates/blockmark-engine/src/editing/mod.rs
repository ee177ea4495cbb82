/*!
 * # Editing
 *
 * Everything that changes a [`Document`](crate::models::Document) after it
 * has been parsed.
 *
 * ## Flow of a key press
 *
 * ```text
 * KeyEvent ─ KeyStateMachine::classify ─ KeyAction ─ Editor ─ Cmd ─ Patch
 * ```
 *
 * 1. The surface reports a key and the caret ([`keys::Focus`]).
 * 2. [`keys::KeyStateMachine`] asks the focused block's variant first, then
 *    checks typed triggers (with help from the [`key_buffer::KeyBuffer`])
 *    and the default Enter and Backspace rules.
 * 3. The resulting [`commands::Cmd`] is applied by the [`editor::Editor`].
 *    Conversions go through the [`conversion::ConversionEngine`], which
 *    holds the [`guard::ReentrancyGuard`] while a block is re-typed.
 * 4. A [`patch::Patch`] tells the surface which blocks changed and where
 *    the caret goes.
 *
 * ## Module Structure
 *
 * - **`commands`**: the `Cmd` enum
 * - **`conversion`**: in-place variant conversion
 * - **`editor`**: one editing session, applies commands
 * - **`guard`**: conversion-in-progress flag
 * - **`key_buffer`**: recent keystrokes
 * - **`keys`**: key events and the trigger state machine
 * - **`patch`**: result of applying a command
 */

pub mod commands;
pub mod conversion;
pub mod editor;
pub mod guard;
pub mod key_buffer;
pub mod keys;
pub mod patch;

pub use commands::Cmd;
pub use conversion::ConversionEngine;
pub use editor::{Editor, KeyOutcome};
pub use guard::{GuardToken, ReentrancyGuard};
pub use key_buffer::KeyBuffer;
pub use keys::{Focus, Key, KeyAction, KeyEvent, KeyStateMachine, TriggerState};
pub use patch::Patch;
